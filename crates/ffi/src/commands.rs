//! Engine commands and synchronous queries
//!
//! Commands only queue work; their results arrive through the event callback.
//! Every function returns `LifeErrorCode::Ok` once the command is queued, or an
//! error code with details in `life_get_last_error()`.

use life_compute_core::{CellState, EngineKind, LifeSimulation};
use std::time::Duration;

use crate::error::{DefaultLifeError, LifeErrorCode};
use crate::helpers::{
    handle_ffi_result_error, instance_from_ptr, with_simulation, with_simulation_mut, write_out,
};
use crate::instance::LifeComputeInstance;

fn parse_state(state: u8) -> Result<CellState, DefaultLifeError> {
    CellState::from_u8(state).ok_or_else(|| DefaultLifeError::invalid_parameter("state", state))
}

/// Queue one generation step, answered by a `TickComplete` event.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_tick(ptr: *const LifeComputeInstance) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation(instance, LifeSimulation::tick)??;
        Ok(())
    })
}

/// Queue a write of one cell, answered by a `CellStateChanged` event.
///
/// `state` is 0 for dead, 1 for alive. Positions off the board are rejected
/// here with `OutOfRange`.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_set_cell_state(
    ptr: *const LifeComputeInstance,
    position: usize,
    state: u8,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        let state = parse_state(state)?;
        with_simulation(instance, |sim| sim.set_cell_state(position, state))??;
        Ok(())
    })
}

/// Queue a write of the cell at `(x, y)`, position `x + height * y`.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_set_cell_state_at(
    ptr: *const LifeComputeInstance,
    x: u32,
    y: u32,
    state: u8,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        let state = parse_state(state)?;
        with_simulation(instance, |sim| sim.set_cell_state_at(x, y, state))??;
        Ok(())
    })
}

/// Queue an inversion of one cell, answered by a `CellStateChanged` event
/// carrying the new state.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_toggle_cell(
    ptr: *const LifeComputeInstance,
    position: usize,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation(instance, |sim| sim.toggle_cell(position))??;
        Ok(())
    })
}

/// Queue a read of one cell, answered by a `CellStateReported` event.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_request_cell_state(
    ptr: *const LifeComputeInstance,
    position: usize,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation(instance, |sim| sim.request_cell_state(position))??;
        Ok(())
    })
}

/// Queue a read of the whole board, answered by a `CellStates` event.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_request_cell_states(
    ptr: *const LifeComputeInstance,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation(instance, LifeSimulation::request_cell_states)??;
        Ok(())
    })
}

/// Queue a reset to an all-dead board at step 0, answered by a `Cleared` event.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_clear(ptr: *const LifeComputeInstance) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation(instance, LifeSimulation::clear)??;
        Ok(())
    })
}

/// Read the active engine's generation count as of its last completed command.
///
/// # Safety
/// - `ptr` must be null or a live pointer returned by `life_new`.
/// - `out_step` must be a valid, non-null pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn life_get_step(
    ptr: *const LifeComputeInstance,
    out_step: *mut u64,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        let step = with_simulation(instance, LifeSimulation::step)?;
        unsafe { write_out(out_step, "out_step", step) }
    })
}

/// Read the board width in cells.
///
/// # Safety
/// - `ptr` must be null or a live pointer returned by `life_new`.
/// - `out_width` must be a valid, non-null pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn life_get_width(
    ptr: *const LifeComputeInstance,
    out_width: *mut u32,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        let width = with_simulation(instance, |sim| sim.dimensions().width())?;
        unsafe { write_out(out_width, "out_width", width) }
    })
}

/// Read the board height in cells.
///
/// # Safety
/// - `ptr` must be null or a live pointer returned by `life_new`.
/// - `out_height` must be a valid, non-null pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn life_get_height(
    ptr: *const LifeComputeInstance,
    out_height: *mut u32,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        let height = with_simulation(instance, |sim| sim.dimensions().height())?;
        unsafe { write_out(out_height, "out_height", height) }
    })
}

/// Replace the active engine, keeping the board.
///
/// `kind` is 0 for the array backend, 1 for the shader backend. If the target
/// backend cannot run here, `UnsupportedEnvironment` is returned and the
/// current engine stays active. Otherwise completion is reported by an
/// `EngineSwapped` event, or `SwapRolledBack` if the new engine still failed.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_swap_engine(
    ptr: *const LifeComputeInstance,
    kind: u8,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        let kind = EngineKind::from_u8(kind)
            .ok_or_else(|| DefaultLifeError::invalid_parameter("kind", kind))?;
        with_simulation_mut(instance, |sim| sim.swap_engine(kind))??;
        Ok(())
    })
}

/// Start posting ticks at the configured period. No-op if already running.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_start_simulation(ptr: *const LifeComputeInstance) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation_mut(instance, LifeSimulation::start_simulation)??;
        Ok(())
    })
}

/// Stop continuous simulation. Ticks already queued still run.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_stop_simulation(ptr: *const LifeComputeInstance) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation_mut(instance, LifeSimulation::stop_simulation)?;
        Ok(())
    })
}

/// Set the continuous-simulation period in milliseconds (at least 20).
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
#[no_mangle]
pub unsafe extern "C" fn life_set_tick_delay(
    ptr: *const LifeComputeInstance,
    delay_ms: u64,
) -> LifeErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr)? };
        with_simulation_mut(instance, |sim| {
            sim.set_tick_delay(Duration::from_millis(delay_ms));
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{LifeEventFfi, LifeEventKind};
    use crate::error::life_get_last_error_code;
    use crate::instance::{life_destroy, life_new};
    use std::os::raw::c_void;
    use std::ptr;
    use std::sync::mpsc;

    /// Reported cells as (kind, position, state)
    type Report = (LifeEventKind, usize, u8);

    unsafe extern "C" fn forward(event: *const LifeEventFfi, user_data: *mut c_void) {
        // SAFETY: tests pass a `Mutex<mpsc::Sender<Report>>` that outlives the instance
        let (event, tx) = unsafe {
            (
                &*event,
                &*user_data.cast::<std::sync::Mutex<mpsc::Sender<Report>>>(),
            )
        };
        let _ = tx
            .lock()
            .unwrap()
            .send((event.kind, event.position, event.state));
    }

    struct Fixture {
        instance: *mut LifeComputeInstance,
        events: mpsc::Receiver<Report>,
        _tx: Box<std::sync::Mutex<mpsc::Sender<Report>>>,
    }

    impl Fixture {
        fn new(width: u32, height: u32) -> Self {
            let (tx, events) = mpsc::channel();
            let tx = Box::new(std::sync::Mutex::new(tx));
            let mut instance = ptr::null_mut();
            let code = unsafe {
                life_new(
                    width,
                    height,
                    0,
                    0,
                    Some(forward),
                    (&raw const *tx).cast_mut().cast(),
                    &raw mut instance,
                )
            };
            assert_eq!(code, LifeErrorCode::Ok);
            Self {
                instance,
                events,
                _tx: tx,
            }
        }

        fn wait_for(&self, kind: LifeEventKind) -> Report {
            loop {
                let report = self
                    .events
                    .recv_timeout(Duration::from_secs(5))
                    .expect("timed out waiting for event");
                if report.0 == kind {
                    return report;
                }
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            unsafe { life_destroy(self.instance) };
        }
    }

    #[test]
    fn test_set_and_request_cell() {
        let fixture = Fixture::new(4, 4);
        let code = unsafe { life_set_cell_state_at(fixture.instance, 1, 2, 1) };
        assert_eq!(code, LifeErrorCode::Ok);
        assert_eq!(
            fixture.wait_for(LifeEventKind::CellStateChanged),
            (LifeEventKind::CellStateChanged, 9, 1)
        );

        unsafe { life_request_cell_state(fixture.instance, 9) };
        assert_eq!(
            fixture.wait_for(LifeEventKind::CellStateReported),
            (LifeEventKind::CellStateReported, 9, 1)
        );
    }

    #[test]
    fn test_toggle_cell() {
        let fixture = Fixture::new(4, 4);
        unsafe { life_toggle_cell(fixture.instance, 5) };
        assert_eq!(fixture.wait_for(LifeEventKind::CellStateChanged).2, 1);
        unsafe { life_toggle_cell(fixture.instance, 5) };
        assert_eq!(fixture.wait_for(LifeEventKind::CellStateChanged).2, 0);
    }

    #[test]
    fn test_invalid_arguments() {
        let fixture = Fixture::new(4, 4);

        let code = unsafe { life_set_cell_state(fixture.instance, 16, 1) };
        assert_eq!(code, LifeErrorCode::OutOfRange);
        assert_eq!(life_get_last_error_code(), LifeErrorCode::OutOfRange);

        let code = unsafe { life_set_cell_state(fixture.instance, 0, 2) };
        assert_eq!(code, LifeErrorCode::InvalidParameter);

        let code = unsafe { life_swap_engine(fixture.instance, 5) };
        assert_eq!(code, LifeErrorCode::InvalidParameter);

        let code = unsafe { life_tick(ptr::null()) };
        assert_eq!(code, LifeErrorCode::NullPointer);

        // A successful call clears the last error
        let code = unsafe { life_tick(fixture.instance) };
        assert_eq!(code, LifeErrorCode::Ok);
        assert_eq!(life_get_last_error_code(), LifeErrorCode::Ok);
    }

    #[test]
    fn test_queries() {
        let fixture = Fixture::new(6, 3);
        let (mut width, mut height, mut step) = (0u32, 0u32, u64::MAX);
        unsafe {
            assert_eq!(
                life_get_width(fixture.instance, &raw mut width),
                LifeErrorCode::Ok
            );
            assert_eq!(
                life_get_height(fixture.instance, &raw mut height),
                LifeErrorCode::Ok
            );
            life_tick(fixture.instance);
        }
        fixture.wait_for(LifeEventKind::TickComplete);
        unsafe {
            assert_eq!(
                life_get_step(fixture.instance, &raw mut step),
                LifeErrorCode::Ok
            );
            assert_eq!(
                life_get_step(fixture.instance, ptr::null_mut()),
                LifeErrorCode::NullPointer
            );
        }
        assert_eq!((width, height, step), (6, 3, 1));
    }

    #[test]
    fn test_swap_and_clear() {
        let fixture = Fixture::new(4, 4);
        unsafe {
            life_set_cell_state(fixture.instance, 3, 1);
            assert_eq!(life_swap_engine(fixture.instance, 0), LifeErrorCode::Ok);
        }
        fixture.wait_for(LifeEventKind::EngineSwapped);

        unsafe { life_request_cell_state(fixture.instance, 3) };
        assert_eq!(fixture.wait_for(LifeEventKind::CellStateReported).2, 1);

        unsafe { life_clear(fixture.instance) };
        fixture.wait_for(LifeEventKind::Cleared);
        unsafe { life_request_cell_states(fixture.instance) };
        fixture.wait_for(LifeEventKind::CellStates);
    }

    #[test]
    fn test_continuous_simulation() {
        let fixture = Fixture::new(4, 4);
        unsafe {
            assert_eq!(life_set_tick_delay(fixture.instance, 1), LifeErrorCode::Ok);
            assert_eq!(life_start_simulation(fixture.instance), LifeErrorCode::Ok);
        }
        fixture.wait_for(LifeEventKind::TickComplete);
        fixture.wait_for(LifeEventKind::TickComplete);
        unsafe {
            assert_eq!(life_stop_simulation(fixture.instance), LifeErrorCode::Ok);
        }
    }
}
