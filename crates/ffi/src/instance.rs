use life_compute_core::{EngineConfig, EngineKind, LifeSimulation, Wraparound};
use std::os::raw::c_void;
use std::ptr;
use std::sync::Mutex;
use tracing::info;

use crate::callback::{CallbackEventSink, LifeEventCallback};
use crate::error::{DefaultLifeError, LifeErrorCode};
use crate::helpers::{clear_last_error, track_error, track_result};

/// A Game of Life board driven by a swappable compute engine.
///
/// # Thread Safety
/// `LifeComputeInstance` can be shared across host threads. Every command only
/// queues work for the engine's worker thread and returns immediately; results
/// arrive through the callback given to `life_new`, on the worker thread.
///
/// The simulation is protected by a `Mutex`, held only while a command is
/// validated and queued.
///
/// ## Example (C)
/// ```c
/// static void on_event(const LifeEventFfi* event, void* user_data) {
///     if (event->kind == LifeEventKind_TickComplete) {
///         redraw(event->states, event->states_len);  // copy if kept
///     }
/// }
///
/// LifeComputeInstance* life = NULL;
/// if (life_new(64, 64, 0, 0, on_event, NULL, &life) != LifeErrorCode_Ok) {
///     fprintf(stderr, "%s\n", life_get_last_error());
///     return;
/// }
/// life_set_cell_state(life, 130, 1);
/// life_start_simulation(life);
/// // ...
/// life_destroy(life);
/// ```
pub struct LifeComputeInstance {
    pub(crate) sim: Mutex<LifeSimulation>,
}

impl LifeComputeInstance {
    /// Creates a new instance and starts its first engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unknown `kind` or `wraparound` values,
    /// and the engine's error for bad dimensions or an unusable backend.
    pub(crate) fn new(
        width: u32,
        height: u32,
        kind: u8,
        wraparound: u8,
        sink: CallbackEventSink,
    ) -> Result<Box<Self>, DefaultLifeError> {
        let kind = EngineKind::from_u8(kind)
            .ok_or_else(|| DefaultLifeError::invalid_parameter("kind", kind))?;
        let wraparound = Wraparound::from_u8(wraparound)
            .ok_or_else(|| DefaultLifeError::invalid_parameter("wraparound", wraparound))?;

        let config = EngineConfig::default()
            .with_kind(kind)
            .with_wraparound(wraparound);
        let sim = LifeSimulation::new(width, height, config, sink)?;

        Ok(Box::new(Self {
            sim: Mutex::new(sim),
        }))
    }
}

/// Create a new instance and return it via out-parameter.
///
/// This function follows standard C error handling conventions:
/// - Returns `LifeErrorCode::Ok` (0) on success with valid instance in `out_instance`
/// - Returns non-zero error code on failure with `out_instance` set to null
///
/// Parameters
/// - `width`, `height`: Board size in cells. The board must hold at least two cells.
/// - `kind`: Initial backend, 0 = array, 1 = shader.
/// - `wraparound`: Edge behaviour, 0 = toroidal, 1 = linear index.
/// - `callback`: Receives every notification, on engine worker threads. May be null.
/// - `user_data`: Passed back to `callback` unchanged.
/// - `out_instance`: Pointer to receive the created instance. Must be non-null.
///
/// Returns
/// - `LifeErrorCode::Ok` (0): success, `out_instance` contains valid pointer
/// - `LifeErrorCode::NullPointer`: `out_instance` is null
/// - `LifeErrorCode::InvalidParameter`: unknown `kind` or `wraparound`
/// - `LifeErrorCode::InvalidDimensions`: board is empty or a single cell
/// - `LifeErrorCode::UnsupportedEnvironment`: the shader backend cannot run here
///
/// Error Details
/// - Call `life_get_last_error()` to retrieve human-readable error description
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller takes ownership of the returned instance and MUST call `life_destroy`
///   exactly once to avoid leaking the engine and its threads.
/// - `callback` must be safe to call from any thread with `user_data` until
///   `life_destroy` returns.
#[no_mangle]
pub unsafe extern "C" fn life_new(
    width: u32,
    height: u32,
    kind: u8,
    wraparound: u8,
    callback: LifeEventCallback,
    user_data: *mut c_void,
    out_instance: *mut *mut LifeComputeInstance,
) -> LifeErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultLifeError::null_pointer("out_instance"));
    }

    let sink = CallbackEventSink::new(callback, user_data);
    match track_result(LifeComputeInstance::new(width, height, kind, wraparound, sink)) {
        Ok(instance) => {
            info!("Created {}x{} life compute instance", width, height);
            clear_last_error();
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            LifeErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                // Set to null on error (per documentation contract)
                *out_instance = ptr::null_mut();
            }

            code
        }
    }
}

/// Destroys an instance previously created by `life_new`.
///
/// Queued commands finish first; the active engine is then destroyed and
/// every worker thread is joined before this returns. The final `Destroyed`
/// notification is delivered during this call.
///
/// Behavior:
/// - If `ptr` is null, this function is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `life_new` and not destroyed already.
/// - The callback must not call back into this instance while it is being destroyed.
/// - After calling this function, the caller must not use the pointer again.
#[no_mangle]
pub unsafe extern "C" fn life_destroy(ptr: *mut LifeComputeInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: The pointer was created by `Box::into_raw` in `life_new` and not
    // freed since. Dropping the box shuts the simulation down.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::life_get_last_error_code;

    #[test]
    fn test_new_and_destroy() {
        let mut instance = ptr::null_mut();
        let code = unsafe { life_new(8, 8, 0, 0, None, ptr::null_mut(), &raw mut instance) };
        assert_eq!(code, LifeErrorCode::Ok);
        assert!(!instance.is_null());
        unsafe { life_destroy(instance) };
    }

    #[test]
    fn test_new_rejects_bad_arguments() {
        let mut instance = ptr::null_mut();

        let code = unsafe { life_new(1, 1, 0, 0, None, ptr::null_mut(), &raw mut instance) };
        assert_eq!(code, LifeErrorCode::InvalidDimensions);
        assert!(instance.is_null());
        assert_eq!(life_get_last_error_code(), LifeErrorCode::InvalidDimensions);

        let code = unsafe { life_new(4, 4, 9, 0, None, ptr::null_mut(), &raw mut instance) };
        assert_eq!(code, LifeErrorCode::InvalidParameter);

        let code = unsafe { life_new(4, 4, 0, 9, None, ptr::null_mut(), &raw mut instance) };
        assert_eq!(code, LifeErrorCode::InvalidParameter);

        let code = unsafe { life_new(4, 4, 0, 0, None, ptr::null_mut(), ptr::null_mut()) };
        assert_eq!(code, LifeErrorCode::NullPointer);
    }

    #[test]
    fn test_destroy_null_is_noop() {
        unsafe { life_destroy(ptr::null_mut()) };
    }
}
