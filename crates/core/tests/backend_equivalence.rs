//! Backend equivalence and engine contract properties
//!
//! Every backend must produce the same generations from the same board, and
//! the basic operations of the compute contract must behave the same on all
//! of them.

mod common;

use common::init_logging;
use life_compute_core::solver::rule::step_generation_cpu;
use life_compute_core::{
    create_compute_engine, ArrayComputeEngine, BoardDimensions, CellState, EngineConfig,
    EngineKind, LifeCompute, Wraparound,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_board(dims: BoardDimensions, seed: u64) -> Vec<CellState> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..dims.cell_count())
        .map(|_| CellState::from(rng.random_bool(0.35)))
        .collect()
}

fn load(engine: &mut dyn LifeCompute, board: &[CellState]) {
    for (position, state) in board.iter().enumerate() {
        engine.set_cell_state(position, *state).unwrap();
    }
}

/// Engines available in this build and environment
fn engines(dims: BoardDimensions, wraparound: Wraparound) -> Vec<Box<dyn LifeCompute>> {
    let config = EngineConfig::default().with_wraparound(wraparound);
    [EngineKind::Array, EngineKind::Shader]
        .into_iter()
        .filter_map(|kind| create_compute_engine(kind, dims, &config, None).ok())
        .collect()
}

#[test]
fn test_array_engine_matches_reference_stepper() {
    init_logging();
    let dims = BoardDimensions::new(17, 11).unwrap();

    for wraparound in [Wraparound::Toroidal, Wraparound::LinearIndex] {
        let board = random_board(dims, 7);
        let mut engine = ArrayComputeEngine::new(dims, wraparound);
        load(&mut engine, &board);

        let mut current = board;
        let mut next = vec![CellState::Dead; dims.cell_count()];
        for generation in 1..=10 {
            step_generation_cpu(&current, &mut next, dims, wraparound);
            std::mem::swap(&mut current, &mut next);
            engine.tick();
            assert_eq!(
                engine.cell_states().as_ref(),
                current.as_slice(),
                "{wraparound:?} generation {generation}"
            );
        }
    }
}

#[test]
fn test_array_engine_deterministic() {
    let dims = BoardDimensions::new(32, 24).unwrap();
    let board = random_board(dims, 42);

    let run = || {
        let mut engine = ArrayComputeEngine::new(dims, Wraparound::Toroidal);
        load(&mut engine, &board);
        for _ in 0..20 {
            engine.tick();
        }
        engine.cell_states().into_owned()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_backends_agree() {
    init_logging();
    // Non-square and wider than a workgroup in one direction only, plus a
    // single row and a single column where every wrap crosses an edge
    let shapes = [(23, 9), (7, 1), (1, 6)];

    for (width, height) in shapes {
        let dims = BoardDimensions::new(width, height).unwrap();
        for wraparound in [Wraparound::Toroidal, Wraparound::LinearIndex] {
            let mut engines = engines(dims, wraparound);
            if engines.len() < 2 {
                // Only run if GPU is available
                return;
            }

            let board = random_board(dims, 1234);
            for engine in &mut engines {
                load(engine.as_mut(), &board);
            }

            for generation in 1..=12 {
                let mut boards = engines.iter_mut().map(|engine| {
                    engine.tick();
                    engine.cell_states().into_owned()
                });
                let reference = boards.next().unwrap();
                for other in boards {
                    assert_eq!(
                        other, reference,
                        "{width}x{height} {wraparound:?} generation {generation}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_dead_board_stays_dead() {
    let dims = BoardDimensions::new(10, 10).unwrap();
    for wraparound in [Wraparound::Toroidal, Wraparound::LinearIndex] {
        for mut engine in engines(dims, wraparound) {
            for _ in 0..3 {
                engine.tick();
            }
            assert!(engine.cell_states().iter().all(|s| !s.is_alive()));
            assert_eq!(engine.step(), 3);
        }
    }
}

#[test]
fn test_set_then_get() {
    let dims = BoardDimensions::new(6, 5).unwrap();
    let board = random_board(dims, 99);

    for mut engine in engines(dims, Wraparound::Toroidal) {
        load(engine.as_mut(), &board);
        for (position, expected) in board.iter().enumerate() {
            assert_eq!(engine.cell_state(position).unwrap(), *expected);
        }
        assert_eq!(engine.cell_states().as_ref(), board.as_slice());
        // Writes do not advance the generation
        assert_eq!(engine.step(), 0);
    }
}

#[test]
fn test_out_of_range_access() {
    let dims = BoardDimensions::new(4, 3).unwrap();
    for mut engine in engines(dims, Wraparound::Toroidal) {
        assert!(engine.cell_state(12).is_err());
        assert!(engine.set_cell_state(12, CellState::Alive).is_err());
        assert!(engine.cell_states().iter().all(|s| !s.is_alive()));
    }
}

#[test]
fn test_clear_resets_board_and_step() {
    let dims = BoardDimensions::new(8, 8).unwrap();
    let board = random_board(dims, 5);

    for mut engine in engines(dims, Wraparound::Toroidal) {
        load(engine.as_mut(), &board);
        engine.tick();
        engine.tick();
        engine.clear();

        assert_eq!(engine.step(), 0);
        assert!(engine.cell_states().iter().all(|s| !s.is_alive()));

        // Both buffers were cleared, not only the visible one
        engine.tick();
        assert!(engine.cell_states().iter().all(|s| !s.is_alive()));
    }
}

#[test]
fn test_destroy_returns_final_generation() {
    let dims = BoardDimensions::new(7, 5).unwrap();
    let board = random_board(dims, 77);

    for mut engine in engines(dims, Wraparound::LinearIndex) {
        load(engine.as_mut(), &board);
        engine.tick();
        let expected = engine.cell_states().into_owned();

        let snapshot = engine.destroy();
        assert_eq!(snapshot.step(), 1);
        assert_eq!(snapshot.dimensions(), dims);
        assert_eq!(snapshot.cells(), expected.as_slice());
    }
}
