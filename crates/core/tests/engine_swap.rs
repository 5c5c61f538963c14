//! Runtime engine swap
//!
//! The board must survive a swap, commands posted after the swap must see the
//! handed-off board, and a swap to a backend that cannot run must leave the
//! current engine in place.

mod common;

use common::{board_states, cells, init_logging, wait_for, GLIDER_AFTER_5, GLIDER_START};
use life_compute_core::{
    CellState, EngineConfig, EngineKind, LifeError, LifeEvent, LifeSimulation, SwapPhase,
};
use std::sync::mpsc;

fn seeded_glider(config: EngineConfig) -> (LifeSimulation, mpsc::Receiver<LifeEvent>) {
    let (tx, events) = mpsc::channel();
    let sim = LifeSimulation::new(5, 5, config, tx).unwrap();
    for (position, state) in cells(&GLIDER_START).into_iter().enumerate() {
        sim.set_cell_state(position, state).unwrap();
    }
    (sim, events)
}

fn run_ticks(sim: &LifeSimulation, events: &mpsc::Receiver<LifeEvent>, count: u64) -> u64 {
    let target = sim.step() + count;
    for _ in 0..count {
        sim.tick().unwrap();
    }
    wait_for(events, |e| {
        matches!(e, LifeEvent::TickComplete { step, .. } if *step == target)
    });
    target
}

#[test]
fn test_swap_preserves_board() {
    init_logging();
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    run_ticks(&sim, &events, 2);
    let before = board_states(&sim, &events);

    sim.swap_engine(EngineKind::Array).unwrap();
    wait_for(&events, |e| matches!(e, LifeEvent::EngineSwapped { .. }));

    assert_eq!(board_states(&sim, &events), before);
    assert_eq!(sim.kind(), EngineKind::Array);
    assert_eq!(sim.swap_phase(), SwapPhase::Active);
}

#[test]
fn test_swap_event_order() {
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    sim.swap_engine(EngineKind::Array).unwrap();

    let destroyed = wait_for(&events, |e| {
        matches!(e, LifeEvent::Destroyed { .. } | LifeEvent::EngineSwapped { .. })
    });
    assert_eq!(
        destroyed,
        LifeEvent::Destroyed {
            kind: EngineKind::Array
        }
    );
    assert_eq!(
        wait_for(&events, |e| matches!(e, LifeEvent::EngineSwapped { .. })),
        LifeEvent::EngineSwapped {
            kind: EngineKind::Array,
            name: "Array"
        }
    );
}

#[test]
fn test_step_resets_by_default() {
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    run_ticks(&sim, &events, 3);
    assert_eq!(sim.step(), 3);

    sim.swap_engine(EngineKind::Array).unwrap();
    // Round trip through the successor so it has published its status
    board_states(&sim, &events);
    assert_eq!(sim.step(), 0);
}

#[test]
fn test_step_carried_when_configured() {
    let config = EngineConfig::default().with_carry_step_on_swap(true);
    let (mut sim, events) = seeded_glider(config);
    run_ticks(&sim, &events, 3);

    sim.swap_engine(EngineKind::Array).unwrap();
    // Readable before the successor has received the snapshot
    assert_eq!(sim.step(), 3);
    board_states(&sim, &events);
    assert_eq!(sim.step(), 3);

    // Generations continue from the handed-off board
    run_ticks(&sim, &events, 2);
    assert_eq!(board_states(&sim, &events), cells(&GLIDER_AFTER_5));
}

#[test]
fn test_commands_after_swap_see_handed_off_board() {
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    sim.swap_engine(EngineKind::Array).unwrap();

    // Posted before the successor has its snapshot; must still observe it
    sim.request_cell_state(2).unwrap();
    assert_eq!(
        wait_for(&events, |e| matches!(e, LifeEvent::CellStateReported { .. })),
        LifeEvent::CellStateReported {
            position: 2,
            state: CellState::Alive
        }
    );
}

#[test]
fn test_commands_before_swap_run_on_old_engine() {
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    sim.tick().unwrap();
    sim.swap_engine(EngineKind::Array).unwrap();

    let first = wait_for(&events, |e| {
        matches!(
            e,
            LifeEvent::TickComplete { .. } | LifeEvent::Destroyed { .. }
        )
    });
    assert!(matches!(first, LifeEvent::TickComplete { step: 1, .. }));
}

#[test]
fn test_repeated_swaps() {
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    for _ in 0..4 {
        sim.swap_engine(EngineKind::Array).unwrap();
    }
    assert_eq!(board_states(&sim, &events), cells(&GLIDER_START));
    assert_eq!(sim.swap_phase(), SwapPhase::Active);
}

#[test]
fn test_swap_after_shutdown() {
    let (mut sim, _events) = seeded_glider(EngineConfig::default());
    sim.shutdown();
    assert_eq!(
        sim.swap_engine(EngineKind::Array),
        Err(LifeError::EngineStopped)
    );
}

#[test]
fn test_swap_to_shader() {
    init_logging();
    let (mut sim, events) = seeded_glider(EngineConfig::default());
    run_ticks(&sim, &events, 1);
    let before = board_states(&sim, &events);

    match sim.swap_engine(EngineKind::Shader) {
        Ok(()) => {
            wait_for(&events, |e| {
                matches!(
                    e,
                    LifeEvent::EngineSwapped { .. } | LifeEvent::SwapRolledBack { .. }
                )
            });
            assert_eq!(board_states(&sim, &events), before);

            // The board keeps evolving identically on the new backend
            run_ticks(&sim, &events, 4);
            assert_eq!(board_states(&sim, &events), cells(&GLIDER_AFTER_5));

            sim.swap_engine(EngineKind::Array).unwrap();
            assert_eq!(board_states(&sim, &events), cells(&GLIDER_AFTER_5));
            assert_eq!(sim.kind(), EngineKind::Array);
        }
        Err(err) => {
            // No usable GPU: the array engine must still be active and intact
            assert!(matches!(err, LifeError::UnsupportedEnvironment(_)));
            assert_eq!(sim.kind(), EngineKind::Array);
            assert_eq!(sim.swap_phase(), SwapPhase::Active);
            assert_eq!(board_states(&sim, &events), before);
            assert_eq!(sim.step(), 1);
        }
    }
}
