//! C ABI over the Game of Life compute engine
//!
//! Hosts create an opaque [`LifeComputeInstance`] with [`life_new`], post
//! commands through the `life_*` functions and receive results through a
//! [`LifeEventCallback`] invoked on engine worker threads. A C header is
//! generated into the workspace root at build time.

mod callback;
mod commands;
mod error;
mod helpers;
mod instance;

pub use callback::{LifeEventCallback, LifeEventFfi, LifeEventKind};
pub use commands::{
    life_clear, life_get_height, life_get_step, life_get_width, life_request_cell_state,
    life_request_cell_states, life_set_cell_state, life_set_cell_state_at, life_set_tick_delay,
    life_start_simulation, life_stop_simulation, life_swap_engine, life_tick, life_toggle_cell,
};
pub use error::{life_get_last_error, life_get_last_error_code, LifeErrorCode};
pub use instance::{life_destroy, life_new, LifeComputeInstance};
