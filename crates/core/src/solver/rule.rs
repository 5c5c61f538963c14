//! Evolution rule and neighbour counting
//!
//! Conway's B3/S23 rule expressed in its "count == 2 keeps the current value"
//! form, which is what the compute shader evaluates:
//!
//! - exactly 3 alive neighbours → alive
//! - exactly 2 alive neighbours → unchanged
//! - anything else → dead
//!
//! The same rule and neighbourhood are mirrored in `shaders/life.wgsl`.

use crate::config::Wraparound;
use crate::core_types::{BoardDimensions, CellState};
use rayon::prelude::*;

/// Relative 2-D offsets of the Moore neighbourhood
const NEIGHBOUR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// B3/S23 evolution rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvolutionRule;

impl EvolutionRule {
    /// Next state of a cell given its current state and alive-neighbour count
    #[inline]
    pub const fn next_state(current: CellState, alive_neighbors: u8) -> CellState {
        match alive_neighbors {
            3 => CellState::Alive,
            2 => current,
            _ => CellState::Dead,
        }
    }
}

/// Count alive neighbours of `position` in `cells`
///
/// # Arguments
///
/// * `cells` - Current generation, `dims.cell_count()` long
/// * `dims` - Board dimensions
/// * `wraparound` - Edge behaviour
/// * `position` - Linear position of the cell
///
/// # Returns
///
/// Number of alive cells among the eight neighbours. On boards narrower than
/// three cells a neighbour may be counted more than once, as on any small torus.
#[inline]
pub fn count_alive_neighbors(
    cells: &[CellState],
    dims: BoardDimensions,
    wraparound: Wraparound,
    position: usize,
) -> u8 {
    let width = i64::from(dims.width());
    let height = i64::from(dims.height());
    let count = width * height;

    let mut alive = 0u8;
    match wraparound {
        Wraparound::Toroidal => {
            let x = position as i64 % width;
            let y = position as i64 / width;
            for (dx, dy) in NEIGHBOUR_OFFSETS {
                let nx = (x + dx).rem_euclid(width);
                let ny = (y + dy).rem_euclid(height);
                alive += u8::from(cells[(nx + ny * width) as usize].is_alive());
            }
        }
        Wraparound::LinearIndex => {
            for (dx, dy) in NEIGHBOUR_OFFSETS {
                let neighbor = (position as i64 + dx + dy * width).rem_euclid(count);
                alive += u8::from(cells[neighbor as usize].is_alive());
            }
        }
    }
    alive
}

/// Compute the next generation from `current` into `next`
///
/// Every cell is evaluated against `current` only, so no update is visible to
/// another cell within the same generation. Rows are processed in parallel.
///
/// # Arguments
///
/// * `current` - Generation being read
/// * `next` - Generation being written, same length as `current`
/// * `dims` - Board dimensions
/// * `wraparound` - Edge behaviour
pub fn step_generation_cpu(
    current: &[CellState],
    next: &mut [CellState],
    dims: BoardDimensions,
    wraparound: Wraparound,
) {
    debug_assert_eq!(current.len(), dims.cell_count());
    debug_assert_eq!(next.len(), dims.cell_count());

    let width = dims.width() as usize;

    next.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, cells_out)| {
            let row_start = row * width;
            for (column, cell_out) in cells_out.iter_mut().enumerate() {
                let position = row_start + column;
                let alive = count_alive_neighbors(current, dims, wraparound, position);
                *cell_out = EvolutionRule::next_state(current[position], alive);
            }
        });
}
