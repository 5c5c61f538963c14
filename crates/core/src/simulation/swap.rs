//! Engine swap protocol
//!
//! `Active(A) → DestroyRequested → SnapshotCaptured → ResourcesReleased → Active(B)`
//!
//! The outgoing engine's worker destroys it, then sends its final generation
//! over a one-shot handoff channel. The incoming engine's worker blocks on that
//! channel before its first command, so every command posted after the swap
//! observes the handed-off board.

use super::events::{EventSink, LifeEvent};
use crate::config::{EngineConfig, EngineKind};
use crate::core_types::{BoardDimensions, Snapshot};
use crate::solver::{create_compute_engine, ArrayComputeEngine, LifeCompute};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use tracing::{info, warn};

/// Progress of the most recent engine swap
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapPhase {
    /// An engine is active and no swap is in flight
    #[default]
    Active = 0,
    /// The outgoing engine has been asked to destroy itself
    DestroyRequested = 1,
    /// The outgoing engine's final generation has been captured
    SnapshotCaptured = 2,
    /// The outgoing engine's resources are gone; the successor is initializing
    ResourcesReleased = 3,
}

impl SwapPhase {
    /// Convert from u8 for FFI compatibility
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Active),
            1 => Some(Self::DestroyRequested),
            2 => Some(Self::SnapshotCaptured),
            3 => Some(Self::ResourcesReleased),
            _ => None,
        }
    }
}

/// Swap phase shared between the simulation and its workers
#[derive(Debug, Default)]
pub(crate) struct SwapState {
    phase: AtomicU8,
}

impl SwapState {
    pub(crate) fn phase(&self) -> SwapPhase {
        SwapPhase::from_u8(self.phase.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub(crate) fn set(&self, phase: SwapPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }
}

/// Sending half of a snapshot handoff
pub(crate) type SnapshotSender = mpsc::SyncSender<Snapshot>;

/// Receiving half of a snapshot handoff
pub(crate) type SnapshotReceiver = mpsc::Receiver<Snapshot>;

/// One-shot channel carrying the outgoing engine's final generation
pub(crate) fn handoff_channel() -> (SnapshotSender, SnapshotReceiver) {
    mpsc::sync_channel(1)
}

/// Deferred initialization of a successor engine
///
/// Blocks until the predecessor has been destroyed, then builds `kind` from
/// its snapshot. If the predecessor vanished without a snapshot the successor
/// starts blank. If `kind` cannot be created, the predecessor's kind
/// (`fallback`) is re-created from the snapshot with its step preserved, and
/// the failure is reported followed by [`LifeEvent::SwapRolledBack`].
///
/// # Returns
///
/// The engine that is now active; there is always one.
pub(crate) fn initialize_successor(
    kind: EngineKind,
    fallback: EngineKind,
    predecessor: &SnapshotReceiver,
    dims: BoardDimensions,
    config: &EngineConfig,
    sink: &dyn EventSink,
) -> Box<dyn LifeCompute> {
    let snapshot = if let Ok(snapshot) = predecessor.recv() {
        Some(snapshot)
    } else {
        warn!("Predecessor engine exited without a snapshot, starting blank");
        None
    };

    match create_compute_engine(kind, dims, config, snapshot.clone()) {
        Ok(engine) => {
            info!("Swapped to {} engine", kind);
            sink.notify(LifeEvent::Ready { kind });
            sink.notify(LifeEvent::EngineSwapped {
                kind,
                name: kind.name(),
            });
            engine
        }
        Err(err) => {
            warn!(
                "Failed to initialize {} engine ({}), rolling back to {}",
                kind, err, fallback
            );
            let rollback_config = config.clone().with_carry_step_on_swap(true);
            let engine = create_compute_engine(fallback, dims, &rollback_config, snapshot.clone())
                .unwrap_or_else(|fallback_err| {
                    warn!(
                        "Rollback to {} failed ({}), using array engine",
                        fallback, fallback_err
                    );
                    let engine: Box<dyn LifeCompute> = Box::new(match snapshot {
                        Some(snapshot) => ArrayComputeEngine::from_snapshot(
                            dims,
                            config.wraparound,
                            snapshot,
                            true,
                        ),
                        None => ArrayComputeEngine::new(dims, config.wraparound),
                    });
                    engine
                });

            let active = engine.kind();
            sink.notify(LifeEvent::Error(err));
            sink.notify(LifeEvent::Ready { kind: active });
            sink.notify(LifeEvent::SwapRolledBack {
                requested: kind,
                kind: active,
            });
            engine
        }
    }
}
