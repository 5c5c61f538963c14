//! Game of Life Compute Core Library
//!
//! A Conway's Game of Life engine with interchangeable compute backends:
//! double-buffered arrays stepped on the CPU, or ping-pong textures stepped by
//! a GPU compute shader. Each engine runs on its own worker thread, driven by
//! a command queue and reporting back through events, and the active backend
//! can be swapped at runtime without losing the board.
//!
//! ## Layout
//!
//! - [`core_types`] - cell states, board dimensions, snapshots
//! - [`solver`] - the `LifeCompute` contract and its backends
//! - [`simulation`] - workers, engine swap, continuous simulation, host façade
//! - [`config`] - backend, wraparound and timer settings
//! - [`error`] - error taxonomy

// Core types and utilities
pub mod core_types;

pub mod config;
pub mod error;

// Compute backends
pub mod solver;

// Workers and host façade
pub mod simulation;

// Re-export core types
pub use core_types::{BoardDimensions, CellState, Snapshot, ALIVE_PIXEL, DEAD_PIXEL};

pub use config::{EngineConfig, EngineKind, Wraparound, DEFAULT_TICK_DELAY, MIN_TICK_DELAY};
pub use error::LifeError;

pub use solver::{create_compute_engine, probe_backend, ArrayComputeEngine, LifeCompute};

#[cfg(feature = "gpu")]
pub use solver::{GpuContext, ShaderComputeEngine};

pub use simulation::{CallbackSink, EventSink, LifeEvent, LifeSimulation, SwapPhase};
