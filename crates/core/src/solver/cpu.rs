//! CPU-based compute engine implementation
//!
//! This module provides the array implementation of the `LifeCompute` trait:
//! two `Vec<CellState>` generation buffers with a role flag, stepped with Rayon.
//! This backend is always available.

use super::rule::step_generation_cpu;
use super::LifeCompute;
use crate::config::{EngineKind, Wraparound};
use crate::core_types::{BoardDimensions, CellState, Snapshot};
use crate::error::LifeError;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Double-buffered array engine
///
/// `ping` and `pong` alternate as the current generation; `using_ping` tells
/// which one is current. Ticking never allocates.
pub struct ArrayComputeEngine {
    ping: Vec<CellState>,
    pong: Vec<CellState>,
    using_ping: bool,
    step: u64,
    dims: BoardDimensions,
    wraparound: Wraparound,
}

impl ArrayComputeEngine {
    /// Create a blank engine
    ///
    /// # Arguments
    ///
    /// * `dims` - Board dimensions
    /// * `wraparound` - Edge behaviour for neighbour lookups
    pub fn new(dims: BoardDimensions, wraparound: Wraparound) -> Self {
        debug!(
            "Creating array compute engine {}x{}",
            dims.width(),
            dims.height()
        );
        Self {
            ping: vec![CellState::Dead; dims.cell_count()],
            pong: vec![CellState::Dead; dims.cell_count()],
            using_ping: true,
            step: 0,
            dims,
            wraparound,
        }
    }

    /// Create an engine seeded from a predecessor's final generation
    ///
    /// The snapshot's cells become the current generation. A snapshot taken
    /// from a board of different dimensions is ignored and the engine starts
    /// blank.
    ///
    /// # Arguments
    ///
    /// * `dims` - Board dimensions
    /// * `wraparound` - Edge behaviour for neighbour lookups
    /// * `snapshot` - Predecessor's final generation
    /// * `carry_step` - Start from the snapshot's step instead of 0
    pub fn from_snapshot(
        dims: BoardDimensions,
        wraparound: Wraparound,
        snapshot: Snapshot,
        carry_step: bool,
    ) -> Self {
        let mut engine = Self::new(dims, wraparound);
        if !snapshot.fits(dims) {
            warn!(
                "Ignoring snapshot of a {}x{} board for a {}x{} engine",
                snapshot.dimensions().width(),
                snapshot.dimensions().height(),
                dims.width(),
                dims.height()
            );
            return engine;
        }
        if carry_step {
            engine.step = snapshot.step();
        }
        engine.ping = snapshot.into_cells();
        engine
    }

    fn current(&self) -> &[CellState] {
        if self.using_ping {
            &self.ping
        } else {
            &self.pong
        }
    }

    fn current_mut(&mut self) -> &mut [CellState] {
        if self.using_ping {
            &mut self.ping
        } else {
            &mut self.pong
        }
    }
}

impl LifeCompute for ArrayComputeEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Array
    }

    fn dimensions(&self) -> BoardDimensions {
        self.dims
    }

    fn tick(&mut self) {
        let (current, next) = if self.using_ping {
            (&self.ping, &mut self.pong)
        } else {
            (&self.pong, &mut self.ping)
        };
        step_generation_cpu(current, next, self.dims, self.wraparound);

        self.using_ping = !self.using_ping;
        self.step += 1;
    }

    fn cell_state(&mut self, position: usize) -> Result<CellState, LifeError> {
        self.dims.check_position(position)?;
        Ok(self.current()[position])
    }

    fn set_cell_state(&mut self, position: usize, state: CellState) -> Result<(), LifeError> {
        self.dims.check_position(position)?;
        self.current_mut()[position] = state;
        Ok(())
    }

    fn cell_states(&mut self) -> Cow<'_, [CellState]> {
        Cow::Borrowed(self.current())
    }

    fn clear(&mut self) {
        self.ping.fill(CellState::Dead);
        self.pong.fill(CellState::Dead);
        self.using_ping = true;
        self.step = 0;
    }

    fn step(&self) -> u64 {
        self.step
    }

    fn is_gpu_accelerated(&self) -> bool {
        false
    }

    fn destroy(self: Box<Self>) -> Snapshot {
        let engine = *self;
        let cells = if engine.using_ping {
            engine.ping
        } else {
            engine.pong
        };
        debug!("Array compute engine destroyed at step {}", engine.step);
        Snapshot::new(engine.dims, engine.step, cells)
            .unwrap_or_else(|_| Snapshot::blank(engine.dims))
    }
}
