//! Shared helpers for integration tests

#![allow(dead_code)]

use life_compute_core::{CellState, LifeEvent};
use std::sync::mpsc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// 5×5 glider, row-major
pub const GLIDER_START: [u8; 25] = [
    0, 0, 1, 0, 0, //
    1, 0, 1, 0, 0, //
    0, 1, 1, 0, 0, //
    0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, //
];

/// The same glider five generations later
pub const GLIDER_AFTER_5: [u8; 25] = [
    0, 0, 0, 0, 0, //
    0, 0, 1, 0, 0, //
    0, 0, 0, 1, 1, //
    0, 0, 1, 1, 0, //
    0, 0, 0, 0, 0, //
];

/// Install a test-friendly subscriber once; `RUST_LOG` controls verbosity
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn cells(pattern: &[u8]) -> Vec<CellState> {
    pattern
        .iter()
        .map(|&v| CellState::from_u8(v).expect("pattern holds only 0 and 1"))
        .collect()
}

/// Receive events until one matches, failing after five seconds of silence
pub fn wait_for<F>(events: &mpsc::Receiver<LifeEvent>, mut predicate: F) -> LifeEvent
where
    F: FnMut(&LifeEvent) -> bool,
{
    loop {
        let event = events
            .recv_timeout(Duration::from_secs(5))
            .expect("timed out waiting for event");
        if predicate(&event) {
            return event;
        }
    }
}

/// Request the whole board and wait for the answer
pub fn board_states(
    sim: &life_compute_core::LifeSimulation,
    events: &mpsc::Receiver<LifeEvent>,
) -> Vec<CellState> {
    sim.request_cell_states().expect("engine running");
    match wait_for(events, |e| matches!(e, LifeEvent::CellStates { .. })) {
        LifeEvent::CellStates { states } => states,
        _ => unreachable!(),
    }
}
