//! Dedicated worker per engine instance
//!
//! Each engine lives on its own thread and is driven by a FIFO command queue,
//! so operations on one engine never run concurrently and always run in
//! submission order. A tick therefore completes, role flip included, before
//! any later command observes the board.

use super::events::{EventSink, LifeEvent};
use super::swap::{initialize_successor, SnapshotReceiver, SnapshotSender, SwapPhase, SwapState};
use crate::config::{EngineConfig, EngineKind};
use crate::core_types::{BoardDimensions, CellState};
use crate::error::LifeError;
use crate::solver::LifeCompute;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Command executed on an engine's worker
pub(crate) enum Command {
    Tick,
    SetCell {
        position: usize,
        state: CellState,
    },
    ToggleCell {
        position: usize,
    },
    ReportCell {
        position: usize,
    },
    ReportCells,
    Clear,
    /// Destroy the engine and exit; the snapshot goes to `handoff` if present
    Destroy {
        handoff: Option<SnapshotSender>,
    },
}

/// How a worker obtains its engine
pub(crate) enum Bootstrap {
    /// Engine already built on the caller's thread
    Fresh(Box<dyn LifeCompute>),
    /// Build `kind` once the predecessor hands over its snapshot
    Handoff {
        kind: EngineKind,
        predecessor: SnapshotReceiver,
        fallback: EngineKind,
        /// Step reported until the successor publishes its own
        carried_step: u64,
    },
}

/// State a worker publishes for synchronous queries
#[derive(Debug)]
pub(crate) struct EngineStatus {
    step: AtomicU64,
    queued_ticks: AtomicUsize,
    kind: AtomicU8,
}

impl EngineStatus {
    fn new(kind: EngineKind, step: u64) -> Self {
        Self {
            step: AtomicU64::new(step),
            queued_ticks: AtomicUsize::new(0),
            kind: AtomicU8::new(kind.as_u8()),
        }
    }

    pub(crate) fn step(&self) -> u64 {
        self.step.load(Ordering::Acquire)
    }

    pub(crate) fn kind(&self) -> EngineKind {
        EngineKind::from_u8(self.kind.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Ticks posted but not yet completed
    #[cfg(test)]
    pub(crate) fn queued_ticks(&self) -> usize {
        self.queued_ticks.load(Ordering::Acquire)
    }

    fn publish(&self, engine: &dyn LifeCompute) {
        self.step.store(engine.step(), Ordering::Release);
        self.kind.store(engine.kind().as_u8(), Ordering::Release);
    }
}

/// Shared pieces every worker needs
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) dims: BoardDimensions,
    pub(crate) config: EngineConfig,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) swap: Arc<SwapState>,
}

/// Posting side of an engine's command queue
#[derive(Clone)]
pub(crate) struct CommandPort {
    commands: mpsc::Sender<Command>,
    status: Arc<EngineStatus>,
}

impl CommandPort {
    /// Queue a command
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::EngineStopped`] if the worker has exited.
    pub(crate) fn post(&self, command: Command) -> Result<(), LifeError> {
        self.commands
            .send(command)
            .map_err(|_| LifeError::EngineStopped)
    }

    /// Queue a tick, counting it as pending until the worker finishes it
    pub(crate) fn post_tick(&self) -> Result<(), LifeError> {
        self.status.queued_ticks.fetch_add(1, Ordering::AcqRel);
        self.post(Command::Tick).inspect_err(|_| {
            self.status.queued_ticks.fetch_sub(1, Ordering::AcqRel);
        })
    }

    /// Queue a tick only if no earlier tick is still pending
    ///
    /// # Returns
    ///
    /// `true` if a tick was queued
    pub(crate) fn post_tick_if_idle(&self) -> Result<bool, LifeError> {
        if self
            .status
            .queued_ticks
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        self.post(Command::Tick)
            .inspect_err(|_| {
                self.status.queued_ticks.fetch_sub(1, Ordering::AcqRel);
            })
            .map(|()| true)
    }

    pub(crate) fn status(&self) -> &EngineStatus {
        &self.status
    }
}

/// A running engine worker
pub(crate) struct EngineHandle {
    port: CommandPort,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    /// Start a worker thread for one engine
    ///
    /// # Arguments
    ///
    /// * `id` - Sequence number used in the thread name
    /// * `bootstrap` - Ready engine, or the handoff it will be built from
    /// * `context` - Board, configuration, sink and swap state
    ///
    /// # Errors
    ///
    /// Returns [`LifeError::UnsupportedEnvironment`] if the OS refuses a thread.
    pub(crate) fn spawn(
        id: usize,
        bootstrap: Bootstrap,
        context: WorkerContext,
    ) -> Result<Self, LifeError> {
        let (kind, step) = match &bootstrap {
            Bootstrap::Fresh(engine) => (engine.kind(), engine.step()),
            Bootstrap::Handoff {
                kind, carried_step, ..
            } => (*kind, *carried_step),
        };
        let status = Arc::new(EngineStatus::new(kind, step));
        let (commands, queue) = mpsc::channel();

        let worker_status = Arc::clone(&status);
        let thread = thread::Builder::new()
            .name(format!("life-compute-{id}"))
            .spawn(move || run(bootstrap, &queue, &worker_status, &context))
            .map_err(|e| {
                LifeError::UnsupportedEnvironment(format!("failed to spawn engine worker: {e}"))
            })?;

        debug!("Spawned {} engine worker {}", kind, id);
        Ok(Self {
            port: CommandPort { commands, status },
            thread: Some(thread),
        })
    }

    pub(crate) fn port(&self) -> &CommandPort {
        &self.port
    }

    pub(crate) fn status(&self) -> &EngineStatus {
        self.port.status()
    }

    /// Whether the worker thread has exited
    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(thread::JoinHandle::is_finished)
    }

    /// Wait for the worker thread to exit
    pub(crate) fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Engine worker panicked");
            }
        }
    }
}

fn run(
    bootstrap: Bootstrap,
    queue: &mpsc::Receiver<Command>,
    status: &EngineStatus,
    context: &WorkerContext,
) {
    let sink = context.sink.as_ref();

    let mut engine = match bootstrap {
        Bootstrap::Fresh(engine) => {
            sink.notify(LifeEvent::Ready {
                kind: engine.kind(),
            });
            engine
        }
        Bootstrap::Handoff {
            kind,
            predecessor,
            fallback,
            ..
        } => {
            let engine = initialize_successor(
                kind,
                fallback,
                &predecessor,
                context.dims,
                &context.config,
                sink,
            );
            context.swap.set(SwapPhase::Active);
            engine
        }
    };
    status.publish(engine.as_ref());

    while let Ok(command) = queue.recv() {
        match command {
            Command::Tick => {
                engine.tick();
                status.publish(engine.as_ref());
                let states = engine.cell_states().into_owned();
                status.queued_ticks.fetch_sub(1, Ordering::AcqRel);
                sink.notify(LifeEvent::TickComplete {
                    step: engine.step(),
                    states,
                });
            }
            Command::SetCell { position, state } => {
                let event = match engine.set_cell_state(position, state) {
                    Ok(()) => LifeEvent::CellStateChanged { position, state },
                    Err(err) => LifeEvent::Error(err),
                };
                sink.notify(event);
            }
            Command::ToggleCell { position } => {
                let toggled = engine.cell_state(position).and_then(|state| {
                    let state = state.toggled();
                    engine.set_cell_state(position, state).map(|()| state)
                });
                let event = match toggled {
                    Ok(state) => LifeEvent::CellStateChanged { position, state },
                    Err(err) => LifeEvent::Error(err),
                };
                sink.notify(event);
            }
            Command::ReportCell { position } => {
                let event = match engine.cell_state(position) {
                    Ok(state) => LifeEvent::CellStateReported { position, state },
                    Err(err) => LifeEvent::Error(err),
                };
                sink.notify(event);
            }
            Command::ReportCells => {
                let states = engine.cell_states().into_owned();
                sink.notify(LifeEvent::CellStates { states });
            }
            Command::Clear => {
                engine.clear();
                status.publish(engine.as_ref());
                let states = engine.cell_states().into_owned();
                sink.notify(LifeEvent::Cleared { states });
            }
            Command::Destroy { handoff } => {
                let kind = engine.kind();
                let snapshot = engine.destroy();
                if handoff.is_some() {
                    context.swap.set(SwapPhase::SnapshotCaptured);
                }
                sink.notify(LifeEvent::Destroyed { kind });

                if let Some(handoff) = handoff {
                    context.swap.set(SwapPhase::ResourcesReleased);
                    // Successor gone means the simulation is shutting down
                    let _ = handoff.send(snapshot);
                }
                debug!("{} engine worker exiting", kind);
                return;
            }
        }
    }

    debug!("Command queue closed, dropping {} engine", engine.kind());
}
