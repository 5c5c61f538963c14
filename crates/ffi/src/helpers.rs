use crate::error::{with_last_error_mut, DefaultLifeError, LifeErrorCode, LifeFfiError};
use crate::instance::LifeComputeInstance;
use life_compute_core::LifeSimulation;
use std::ffi::CString;
use tracing::debug;

/// Set the thread-local error message and code.
/// Internal helper for FFI functions to record failure details.
/// Accepts any type implementing `LifeFfiError` trait.
pub(crate) fn set_last_error(error: &impl LifeFfiError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
/// More efficient than handling results for immediate errors.
#[inline]
pub(crate) fn track_error(error: &impl LifeFfiError) -> LifeErrorCode {
    debug!("FFI call failed ({:?}): {}", error.code(), error.msg());
    set_last_error(error);
    error.code()
}

/// Record the error of a failed result, passing successes through.
pub(crate) fn track_result<T>(result: Result<T, DefaultLifeError>) -> Result<T, LifeErrorCode> {
    result.map_err(|error| track_error(&error))
}

/// Clear the thread-local error message and code.
/// Internal helper called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = LifeErrorCode::Ok;
    });
}

/// Run an FFI body and translate its outcome into an error code,
/// updating the thread-local error either way.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> LifeErrorCode
where
    F: FnOnce() -> Result<(), DefaultLifeError>,
{
    match f() {
        Ok(()) => {
            clear_last_error();
            LifeErrorCode::Ok
        }
        Err(error) => track_error(&error),
    }
}

/// Borrow an instance from a raw pointer handed out by `life_new`.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `life_new`.
pub(crate) unsafe fn instance_from_ptr<'a>(
    ptr: *const LifeComputeInstance,
) -> Result<&'a LifeComputeInstance, DefaultLifeError> {
    // SAFETY: non-null pointers come from `Box::into_raw` in `life_new`
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultLifeError::null_pointer("ptr"))
}

/// Lock the simulation for a shared operation.
pub(crate) fn with_simulation<F, T>(
    instance: &LifeComputeInstance,
    func: F,
) -> Result<T, DefaultLifeError>
where
    F: FnOnce(&LifeSimulation) -> T,
{
    let sim = instance
        .sim
        .lock()
        .map_err(|_| DefaultLifeError::lock_poisoned("Mutex"))?;
    Ok(func(&sim))
}

/// Lock the simulation for an operation that reconfigures it.
pub(crate) fn with_simulation_mut<F, T>(
    instance: &LifeComputeInstance,
    func: F,
) -> Result<T, DefaultLifeError>
where
    F: FnOnce(&mut LifeSimulation) -> T,
{
    let mut sim = instance
        .sim
        .lock()
        .map_err(|_| DefaultLifeError::lock_poisoned("Mutex"))?;
    Ok(func(&mut sim))
}

/// Write `value` through an out-parameter.
///
/// # Safety
/// `out` must be null or valid for writes of `T`.
pub(crate) unsafe fn write_out<T>(
    out: *mut T,
    name: &str,
    value: T,
) -> Result<(), DefaultLifeError> {
    if out.is_null() {
        return Err(DefaultLifeError::null_pointer(name));
    }
    // SAFETY: checked non-null above, validity is the caller's contract
    unsafe { out.write(value) };
    Ok(())
}
