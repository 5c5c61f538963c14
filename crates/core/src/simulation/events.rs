//! Outbound notifications
//!
//! Every command posted to an engine completes asynchronously on the engine's
//! worker thread; its result comes back to the host as a [`LifeEvent`]
//! delivered through an [`EventSink`].

use crate::config::EngineKind;
use crate::core_types::CellState;
use crate::error::LifeError;
use std::sync::mpsc;

/// Notification delivered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifeEvent {
    /// An engine finished initialization and accepts commands
    Ready {
        /// Backend that became ready
        kind: EngineKind,
    },
    /// A tick committed a new generation
    TickComplete {
        /// Step counter after the tick
        step: u64,
        /// The new generation
        states: Vec<CellState>,
    },
    /// Answer to a single-cell request
    CellStateReported {
        /// Requested position
        position: usize,
        /// Its current state
        state: CellState,
    },
    /// Answer to a whole-board request
    CellStates {
        /// Current generation
        states: Vec<CellState>,
    },
    /// The board was cleared
    Cleared {
        /// All-dead generation
        states: Vec<CellState>,
    },
    /// A cell was written or toggled
    CellStateChanged {
        /// Written position
        position: usize,
        /// State after the write
        state: CellState,
    },
    /// An engine released its resources
    Destroyed {
        /// Backend that was destroyed
        kind: EngineKind,
    },
    /// A swap completed and the new backend is active
    EngineSwapped {
        /// New backend
        kind: EngineKind,
        /// User-facing name of the new backend
        name: &'static str,
    },
    /// A swap failed after the old engine was destroyed; the old backend was
    /// re-created from its final generation
    SwapRolledBack {
        /// Backend the caller asked for
        requested: EngineKind,
        /// Backend now active
        kind: EngineKind,
    },
    /// A command failed on the worker
    Error(LifeError),
}

/// Receiver of [`LifeEvent`]s
///
/// Called from engine worker threads, never from the caller's thread.
/// Implementations must not block for long: a slow sink stalls the engine.
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn notify(&self, event: LifeEvent);
}

impl EventSink for mpsc::Sender<LifeEvent> {
    fn notify(&self, event: LifeEvent) {
        // The host hung up; nothing left to notify
        let _ = self.send(event);
    }
}

/// Adapter turning a closure into an [`EventSink`]
///
/// # Example
///
/// ```
/// use life_compute_core::simulation::{CallbackSink, EventSink, LifeEvent};
/// use life_compute_core::EngineKind;
///
/// let sink = CallbackSink(|event: LifeEvent| println!("{event:?}"));
/// sink.notify(LifeEvent::Ready { kind: EngineKind::Array });
/// ```
pub struct CallbackSink<F>(pub F);

impl<F> EventSink for CallbackSink<F>
where
    F: Fn(LifeEvent) + Send + Sync,
{
    fn notify(&self, event: LifeEvent) {
        (self.0)(event);
    }
}
