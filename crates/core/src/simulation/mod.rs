//! Host-facing simulation
//!
//! [`LifeSimulation`] owns the active engine's worker and routes host commands
//! to it. Every command returns as soon as it is queued; results arrive as
//! [`LifeEvent`]s on the sink given at construction. Caller mistakes
//! (positions off the board, unusable backends) are rejected synchronously.
//!
//! # Example
//!
//! ```
//! use life_compute_core::simulation::{LifeEvent, LifeSimulation};
//! use life_compute_core::{CellState, EngineConfig};
//! use std::sync::mpsc;
//!
//! let (tx, events) = mpsc::channel();
//! let mut sim = LifeSimulation::new(5, 5, EngineConfig::default(), tx).unwrap();
//! sim.set_cell_state(12, CellState::Alive).unwrap();
//! sim.request_cell_state(12).unwrap();
//! sim.shutdown();
//!
//! let reported = events.iter().any(|e| {
//!     e == LifeEvent::CellStateReported { position: 12, state: CellState::Alive }
//! });
//! assert!(reported);
//! ```

mod events;
mod swap;
mod tick_driver;
mod worker;

pub use events::{CallbackSink, EventSink, LifeEvent};
pub use swap::SwapPhase;

use crate::config::{clamp_tick_delay, EngineConfig, EngineKind};
use crate::core_types::{BoardDimensions, CellState};
use crate::error::LifeError;
use crate::solver::{create_compute_engine, probe_backend};
use std::sync::Arc;
use std::time::Duration;
use swap::{handoff_channel, SwapState};
use tick_driver::TickDriver;
use tracing::{info, warn};
use worker::{Bootstrap, Command, EngineHandle, WorkerContext};

/// A Game of Life board driven by a swappable compute engine
pub struct LifeSimulation {
    context: WorkerContext,
    active: EngineHandle,
    // Destroyed engines whose workers may still be finishing
    retired: Vec<EngineHandle>,
    driver: Option<TickDriver>,
    tick_delay: Duration,
    next_worker_id: usize,
    shut_down: bool,
}

impl LifeSimulation {
    /// Create a simulation and start its first engine
    ///
    /// # Arguments
    ///
    /// * `width` - Board width in cells
    /// * `height` - Board height in cells
    /// * `config` - Backend, wraparound, swap and timer settings
    /// * `sink` - Receives every notification, on worker threads
    ///
    /// # Errors
    ///
    /// - [`LifeError::InvalidDimensions`] if the board is empty or smaller than 1×2
    /// - [`LifeError::UnsupportedEnvironment`] if `config.kind` cannot run here
    pub fn new<S>(width: u32, height: u32, config: EngineConfig, sink: S) -> Result<Self, LifeError>
    where
        S: EventSink + 'static,
    {
        let dims = BoardDimensions::new(width, height)?;
        let engine = create_compute_engine(config.kind, dims, &config, None)?;
        info!(
            "Starting {}x{} simulation on the {} engine",
            width, height, config.kind
        );

        let tick_delay = clamp_tick_delay(config.tick_delay);
        let context = WorkerContext {
            dims,
            config,
            sink: Arc::new(sink),
            swap: Arc::new(SwapState::default()),
        };
        let active = EngineHandle::spawn(0, Bootstrap::Fresh(engine), context.clone())?;

        Ok(Self {
            context,
            active,
            retired: Vec::new(),
            driver: None,
            tick_delay,
            next_worker_id: 1,
            shut_down: false,
        })
    }

    /// Board dimensions
    pub fn dimensions(&self) -> BoardDimensions {
        self.context.dims
    }

    /// Configuration the simulation was created with
    pub fn config(&self) -> &EngineConfig {
        &self.context.config
    }

    /// Backend of the active engine
    ///
    /// During a swap this is the requested backend; after a rollback it is the
    /// backend that was restored.
    pub fn kind(&self) -> EngineKind {
        self.active.status().kind()
    }

    /// Generation count of the active engine as of its last completed command
    pub fn step(&self) -> u64 {
        self.active.status().step()
    }

    /// Progress of the most recent engine swap
    pub fn swap_phase(&self) -> SwapPhase {
        self.context.swap.phase()
    }

    /// Queue one generation step
    ///
    /// Completion is reported by [`LifeEvent::TickComplete`].
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::EngineStopped`] after [`shutdown`](Self::shutdown).
    pub fn tick(&self) -> Result<(), LifeError> {
        self.active.port().post_tick()
    }

    /// Queue a write of one cell
    ///
    /// Completion is reported by [`LifeEvent::CellStateChanged`].
    ///
    /// # Errors
    ///
    /// - [`LifeError::OutOfRange`] if `position` is off the board
    /// - [`LifeError::EngineStopped`] after [`shutdown`](Self::shutdown)
    pub fn set_cell_state(&self, position: usize, state: CellState) -> Result<(), LifeError> {
        self.context.dims.check_position(position)?;
        self.active
            .port()
            .post(Command::SetCell { position, state })
    }

    /// Queue a write of the cell at host coordinates `(x, y)`, position `x + height * y`
    ///
    /// # Errors
    ///
    /// Same as [`set_cell_state`](Self::set_cell_state).
    pub fn set_cell_state_at(&self, x: u32, y: u32, state: CellState) -> Result<(), LifeError> {
        let position = self.context.dims.position(x, y)?;
        self.set_cell_state(position, state)
    }

    /// Queue an inversion of one cell
    ///
    /// Read and write happen together on the worker; the new state is reported
    /// by [`LifeEvent::CellStateChanged`].
    ///
    /// # Errors
    ///
    /// Same as [`set_cell_state`](Self::set_cell_state).
    pub fn toggle_cell(&self, position: usize) -> Result<(), LifeError> {
        self.context.dims.check_position(position)?;
        self.active.port().post(Command::ToggleCell { position })
    }

    /// Queue a read of one cell, answered by [`LifeEvent::CellStateReported`]
    ///
    /// # Errors
    ///
    /// Same as [`set_cell_state`](Self::set_cell_state).
    pub fn request_cell_state(&self, position: usize) -> Result<(), LifeError> {
        self.context.dims.check_position(position)?;
        self.active.port().post(Command::ReportCell { position })
    }

    /// Queue a read of the cell at host coordinates `(x, y)`
    ///
    /// # Errors
    ///
    /// Same as [`set_cell_state`](Self::set_cell_state).
    pub fn request_cell_state_at(&self, x: u32, y: u32) -> Result<(), LifeError> {
        let position = self.context.dims.position(x, y)?;
        self.request_cell_state(position)
    }

    /// Queue a read of the whole board, answered by [`LifeEvent::CellStates`]
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::EngineStopped`] after [`shutdown`](Self::shutdown).
    pub fn request_cell_states(&self) -> Result<(), LifeError> {
        self.active.port().post(Command::ReportCells)
    }

    /// Queue a reset to an all-dead board at step 0, answered by [`LifeEvent::Cleared`]
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::EngineStopped`] after [`shutdown`](Self::shutdown).
    pub fn clear(&self) -> Result<(), LifeError> {
        self.active.port().post(Command::Clear)
    }

    /// Replace the active engine with a `kind` engine, keeping the board
    ///
    /// The target backend is probed first; if it cannot run, the current
    /// engine is left untouched. Otherwise the current engine is destroyed
    /// after its queued commands, and the successor starts from its final
    /// generation. Completion is reported by [`LifeEvent::EngineSwapped`], or
    /// by [`LifeEvent::SwapRolledBack`] if the successor still failed.
    ///
    /// Swapping to the active backend is allowed and re-creates it.
    ///
    /// # Errors
    ///
    /// - [`LifeError::UnsupportedEnvironment`] if `kind` cannot run here
    /// - [`LifeError::EngineStopped`] after [`shutdown`](Self::shutdown)
    pub fn swap_engine(&mut self, kind: EngineKind) -> Result<(), LifeError> {
        if self.shut_down {
            return Err(LifeError::EngineStopped);
        }
        if let Err(err) = probe_backend(kind, self.context.dims) {
            warn!("Refusing swap to {} engine: {}", kind, err);
            return Err(err);
        }

        let was_simulating = self.is_simulating();
        self.stop_simulation();

        let fallback = self.kind();
        let carried_step = if self.context.config.carry_step_on_swap {
            self.step()
        } else {
            0
        };
        let (handoff, predecessor) = handoff_channel();
        let successor = EngineHandle::spawn(
            self.next_worker_id,
            Bootstrap::Handoff {
                kind,
                predecessor,
                fallback,
                carried_step,
            },
            self.context.clone(),
        )?;
        self.next_worker_id += 1;

        info!("Swapping {} engine for {} engine", fallback, kind);
        self.context.swap.set(SwapPhase::DestroyRequested);
        if self
            .active
            .port()
            .post(Command::Destroy {
                handoff: Some(handoff),
            })
            .is_err()
        {
            // The successor sees the closed handoff and starts blank
            warn!("Active engine already stopped before swap");
        }

        let predecessor = std::mem::replace(&mut self.active, successor);
        self.retired.push(predecessor);
        self.reap_retired();

        if was_simulating {
            self.start_simulation()?;
        }
        Ok(())
    }

    /// Post ticks continuously at the configured period
    ///
    /// Does nothing if already running.
    ///
    /// # Errors
    ///
    /// - [`LifeError::EngineStopped`] after [`shutdown`](Self::shutdown)
    /// - [`LifeError::UnsupportedEnvironment`] if the timer thread cannot start
    pub fn start_simulation(&mut self) -> Result<(), LifeError> {
        if self.shut_down {
            return Err(LifeError::EngineStopped);
        }
        if self.driver.is_none() {
            self.driver = Some(TickDriver::start(
                self.active.port().clone(),
                self.tick_delay,
            )?);
        }
        Ok(())
    }

    /// Stop continuous simulation, cancelling the pending scheduled tick
    ///
    /// Ticks already queued on the engine still run.
    pub fn stop_simulation(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.stop();
        }
    }

    /// Change the continuous-simulation period (clamped to at least 20 ms)
    ///
    /// A running timer restarts its wait with the new period.
    pub fn set_tick_delay(&mut self, delay: Duration) {
        self.tick_delay = clamp_tick_delay(delay);
        if let Some(driver) = &self.driver {
            driver.set_delay(self.tick_delay);
        }
    }

    /// Current continuous-simulation period
    pub fn tick_delay(&self) -> Duration {
        self.tick_delay
    }

    /// Whether continuous simulation is running
    pub fn is_simulating(&self) -> bool {
        self.driver.is_some()
    }

    /// Destroy the active engine after its queued commands and join every worker
    ///
    /// Later commands fail with [`LifeError::EngineStopped`]. Called on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.stop_simulation();

        let _ = self.active.port().post(Command::Destroy { handoff: None });
        self.active.join();
        for handle in &mut self.retired {
            handle.join();
        }
        self.retired.clear();
        info!("Simulation shut down");
    }

    fn reap_retired(&mut self) {
        self.retired.retain_mut(|handle| {
            if handle.is_finished() {
                handle.join();
                false
            } else {
                true
            }
        });
    }
}

impl Drop for LifeSimulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
