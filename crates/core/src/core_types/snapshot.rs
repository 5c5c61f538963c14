//! Immutable generation buffer handed from an outgoing engine to its successor

use super::board::BoardDimensions;
use super::cell::CellState;
use crate::error::LifeError;
use serde::{Deserialize, Serialize};

/// Final board state captured when an engine is destroyed
///
/// A snapshot is produced once by [`LifeCompute::destroy`](crate::solver::LifeCompute::destroy)
/// and consumed once by the replacement engine. It is never mutated in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    dimensions: BoardDimensions,
    step: u64,
    cells: Vec<CellState>,
}

impl Snapshot {
    /// Wrap a generation buffer
    ///
    /// # Arguments
    ///
    /// * `dimensions` - Board the buffer describes
    /// * `step` - Generation count at capture time
    /// * `cells` - Cell states in linear position order
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::SnapshotLengthMismatch`] if `cells.len()` is not
    /// `dimensions.cell_count()`.
    pub fn new(
        dimensions: BoardDimensions,
        step: u64,
        cells: Vec<CellState>,
    ) -> Result<Self, LifeError> {
        if cells.len() != dimensions.cell_count() {
            return Err(LifeError::SnapshotLengthMismatch {
                expected: dimensions.cell_count(),
                actual: cells.len(),
            });
        }
        Ok(Self {
            dimensions,
            step,
            cells,
        })
    }

    /// All-dead board at step 0
    pub fn blank(dimensions: BoardDimensions) -> Self {
        Self {
            dimensions,
            step: 0,
            cells: vec![CellState::Dead; dimensions.cell_count()],
        }
    }

    pub fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Whether this snapshot can seed a board of `dimensions`
    pub fn fits(&self, dimensions: BoardDimensions) -> bool {
        self.dimensions == dimensions
    }

    /// Take ownership of the buffer
    pub fn into_cells(self) -> Vec<CellState> {
        self.cells
    }
}
