//! Core types and utilities

pub mod board;
pub mod cell;
pub mod snapshot;

pub use board::BoardDimensions;
pub use cell::{CellState, ALIVE_PIXEL, DEAD_PIXEL};
pub use snapshot::Snapshot;
