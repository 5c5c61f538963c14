//! Compute engine trait definition
//!
//! This module defines the `LifeCompute` trait, the backend-agnostic contract
//! that both the array engine and the shader engine implement.

use crate::config::EngineKind;
use crate::core_types::{BoardDimensions, CellState, Snapshot};
use crate::error::LifeError;
use std::borrow::Cow;

/// Backend-agnostic Game of Life compute engine
///
/// Every engine owns two generation buffers and flips their "current" role on
/// each tick, so a tick never observes its own writes. Engines are driven from a
/// single worker thread (see [`simulation`](crate::simulation)) and therefore
/// only need to be `Send`.
pub trait LifeCompute: Send {
    /// Backend kind of this engine
    fn kind(&self) -> EngineKind;

    /// Board dimensions, fixed for the engine's lifetime
    fn dimensions(&self) -> BoardDimensions;

    /// Advance the board by exactly one generation
    ///
    /// Evaluates the evolution rule for every cell against the pre-tick
    /// generation, commits the result into the other buffer, flips roles and
    /// increments the step counter by one.
    fn tick(&mut self);

    /// Read one cell from the current generation
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::OutOfRange`] if `position` is off the board.
    fn cell_state(&mut self, position: usize) -> Result<CellState, LifeError>;

    /// Write one cell into the current generation
    ///
    /// Does not advance the step counter.
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::OutOfRange`] if `position` is off the board.
    fn set_cell_state(&mut self, position: usize, state: CellState) -> Result<(), LifeError>;

    /// Read the whole current generation
    ///
    /// # Returns
    ///
    /// `width * height` states in linear position order. Borrowed when the
    /// backend keeps the generation in host memory, owned when it had to be
    /// read back from the GPU.
    fn cell_states(&mut self) -> Cow<'_, [CellState]>;

    /// Set every cell to dead in both buffers and reset the step counter
    fn clear(&mut self);

    /// Number of ticks since creation or the last clear
    fn step(&self) -> u64;

    /// Whether this engine runs on the GPU
    fn is_gpu_accelerated(&self) -> bool;

    /// Release every engine-owned resource
    ///
    /// # Returns
    ///
    /// The final generation, for handing to a successor engine
    fn destroy(self: Box<Self>) -> Snapshot;
}
