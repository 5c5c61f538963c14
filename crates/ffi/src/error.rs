use life_compute_core::LifeError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// This trait provides a unified way to handle errors across the FFI boundary,
/// allowing both simple error codes and custom error messages.
///
/// # Design
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait LifeFfiError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> LifeErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `LifeFfiError` for common FFI error scenarios.
///
/// Wraps a `LifeErrorCode` with a message; engine errors convert into it
/// through `From<LifeError>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultLifeError {
    code: LifeErrorCode,
    msg: String,
}

impl DefaultLifeError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: LifeErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    ///
    /// # Arguments
    /// * `lock_name` - The name of the lock that was poisoned (e.g., `"Mutex"`)
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: LifeErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for an enum discriminant or value the engine does not know.
    ///
    /// # Arguments
    /// * `param_name` - The name of the invalid parameter (e.g., `"kind"`, `"state"`)
    /// * `value` - The rejected raw value
    pub fn invalid_parameter(param_name: &str, value: impl std::fmt::Display) -> Self {
        Self {
            code: LifeErrorCode::InvalidParameter,
            msg: format!("Parameter '{param_name}' has unknown value {value}"),
        }
    }
}

impl LifeFfiError for DefaultLifeError {
    fn code(&self) -> LifeErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<LifeError> for DefaultLifeError {
    fn from(error: LifeError) -> Self {
        let code = match error {
            LifeError::InvalidDimensions { .. } => LifeErrorCode::InvalidDimensions,
            LifeError::OutOfRange { .. } | LifeError::SnapshotLengthMismatch { .. } => {
                LifeErrorCode::OutOfRange
            }
            LifeError::UnsupportedEnvironment(_) => LifeErrorCode::UnsupportedEnvironment,
            LifeError::EngineStopped => LifeErrorCode::EngineStopped,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

/// FFI error codes returned by life compute functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Board width or height is zero, or the board is smaller than 1x2.
    InvalidDimensions = 3,

    /// Cell position or coordinates lie outside the board.
    OutOfRange = 4,

    /// The requested backend cannot run on this machine or build.
    UnsupportedEnvironment = 5,

    /// The engine has been shut down.
    EngineStopped = 6,

    /// Invalid parameter passed to function.
    InvalidParameter = 7,
}

impl LifeErrorCode {
    /// Map an engine error to its code without keeping the message
    pub fn from_life_error(error: &LifeError) -> Self {
        DefaultLifeError::from(error.clone()).code
    }
}

impl From<DefaultLifeError> for LifeErrorCode {
    fn from(error: DefaultLifeError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// Allows callers to retrieve diagnostic information after a failed call.
    /// The CString is stored to prevent memory leaks when returning raw pointers via FFI.
    static LAST_ERROR: RefCell<(Option<CString>, LifeErrorCode)> = const { RefCell::new((None, LifeErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, LifeErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, LifeErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if it succeeded or the message cannot be converted to a C string.
///
/// # Thread Safety
/// Error messages are stored per-thread (thread-local storage). Errors raised
/// on engine worker threads are delivered through the event callback instead.
///
/// # Lifetime
/// The returned pointer is valid until:
/// - The next FFI call on this thread that sets or clears the error
/// - The thread terminates
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// LifeComputeInstance* life = nullptr;
/// LifeErrorCode err = life_new(64, 64, 1, 0, on_event, nullptr, &life);
/// if (err != LifeErrorCode_Ok) {
///     const char* error = life_get_last_error();
///     if (error) {
///         printf("Engine creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn life_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns:
/// - `LifeErrorCode::Ok` (0) if the last call on this thread succeeded
/// - The specific error code from the last failed operation
#[no_mangle]
pub extern "C" fn life_get_last_error_code() -> LifeErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
