use crate::error::LifeErrorCode;
use life_compute_core::{CellState, EngineKind, EventSink, LifeEvent};
use std::os::raw::c_void;
use std::ptr;

/// Which notification a `LifeEventFfi` carries.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeEventKind {
    /// An engine finished initializing. `engine_kind` is set.
    Ready = 0,
    /// A generation step completed. `step` and `states` are set.
    TickComplete = 1,
    /// Answer to `life_request_cell_state`. `position` and `state` are set.
    CellStateReported = 2,
    /// Answer to `life_request_cell_states`. `states` is set.
    CellStates = 3,
    /// The board was cleared. `states` is set.
    Cleared = 4,
    /// A set or toggle completed. `position` and `state` are set.
    CellStateChanged = 5,
    /// An engine released its resources. `engine_kind` is set.
    Destroyed = 6,
    /// A swap completed. `engine_kind` is the new backend.
    EngineSwapped = 7,
    /// A swap failed after the old engine was destroyed.
    /// `requested_kind` failed, `engine_kind` is the restored backend.
    SwapRolledBack = 8,
    /// A command failed on the engine. `error_code` is set.
    Error = 9,
}

/// FFI-friendly notification passed to the host callback.
/// Keep this layout stable for C/C++/C# consumers.
///
/// Fields not listed for a given `kind` are zero.
#[repr(C)]
pub struct LifeEventFfi {
    /// Notification kind.
    pub kind: LifeEventKind,

    /// Cell position (`CellStateReported`, `CellStateChanged`).
    pub position: usize,

    /// Cell state, 0 = dead, 1 = alive (`CellStateReported`, `CellStateChanged`).
    pub state: u8,

    /// Generation count (`TickComplete`).
    pub step: u64,

    /// Backend, 0 = array, 1 = shader.
    pub engine_kind: u8,

    /// Backend that was requested (`SwapRolledBack`).
    pub requested_kind: u8,

    /// Failure code (`Error`).
    pub error_code: LifeErrorCode,

    /// Borrowed cell states, one byte per cell, 0 = dead, 1 = alive.
    /// **Valid only for the duration of the callback.** Copy it if needed later.
    pub states: *const u8,

    /// Number of entries in `states`.
    pub states_len: usize,
}

impl LifeEventFfi {
    fn empty(kind: LifeEventKind) -> Self {
        Self {
            kind,
            position: 0,
            state: 0,
            step: 0,
            engine_kind: 0,
            requested_kind: 0,
            error_code: LifeErrorCode::Ok,
            states: ptr::null(),
            states_len: 0,
        }
    }

    fn with_states(kind: LifeEventKind, states: &[CellState]) -> Self {
        Self {
            // `CellState` is `repr(u8)` with discriminants 0 and 1
            states: states.as_ptr().cast::<u8>(),
            states_len: states.len(),
            ..Self::empty(kind)
        }
    }

    fn with_engine(kind: LifeEventKind, engine: EngineKind) -> Self {
        Self {
            engine_kind: engine.as_u8(),
            ..Self::empty(kind)
        }
    }

    fn with_cell(kind: LifeEventKind, position: usize, state: CellState) -> Self {
        Self {
            position,
            state: state.as_u8(),
            ..Self::empty(kind)
        }
    }
}

/// Host notification callback.
///
/// Invoked on engine worker threads, never on the thread that posted the
/// command. `event` is only valid for the duration of the call.
pub type LifeEventCallback =
    Option<unsafe extern "C" fn(event: *const LifeEventFfi, user_data: *mut c_void)>;

/// Opaque host pointer handed back to every callback.
struct UserData(*mut c_void);

// SAFETY: the pointer is never dereferenced here; `life_new` requires the
// host to accept callbacks on any thread.
unsafe impl Send for UserData {}
// SAFETY: see above
unsafe impl Sync for UserData {}

/// Event sink forwarding notifications to a C callback
pub(crate) struct CallbackEventSink {
    callback: LifeEventCallback,
    user_data: UserData,
}

impl CallbackEventSink {
    pub(crate) fn new(callback: LifeEventCallback, user_data: *mut c_void) -> Self {
        Self {
            callback,
            user_data: UserData(user_data),
        }
    }
}

impl EventSink for CallbackEventSink {
    fn notify(&self, event: LifeEvent) {
        let Some(callback) = self.callback else {
            return;
        };

        let ffi_event = match &event {
            LifeEvent::Ready { kind } => LifeEventFfi::with_engine(LifeEventKind::Ready, *kind),
            LifeEvent::TickComplete { step, states } => LifeEventFfi {
                step: *step,
                ..LifeEventFfi::with_states(LifeEventKind::TickComplete, states)
            },
            LifeEvent::CellStateReported { position, state } => {
                LifeEventFfi::with_cell(LifeEventKind::CellStateReported, *position, *state)
            }
            LifeEvent::CellStates { states } => {
                LifeEventFfi::with_states(LifeEventKind::CellStates, states)
            }
            LifeEvent::Cleared { states } => {
                LifeEventFfi::with_states(LifeEventKind::Cleared, states)
            }
            LifeEvent::CellStateChanged { position, state } => {
                LifeEventFfi::with_cell(LifeEventKind::CellStateChanged, *position, *state)
            }
            LifeEvent::Destroyed { kind } => {
                LifeEventFfi::with_engine(LifeEventKind::Destroyed, *kind)
            }
            LifeEvent::EngineSwapped { kind, .. } => {
                LifeEventFfi::with_engine(LifeEventKind::EngineSwapped, *kind)
            }
            LifeEvent::SwapRolledBack { requested, kind } => LifeEventFfi {
                requested_kind: requested.as_u8(),
                ..LifeEventFfi::with_engine(LifeEventKind::SwapRolledBack, *kind)
            },
            LifeEvent::Error(error) => LifeEventFfi {
                error_code: LifeErrorCode::from_life_error(error),
                ..LifeEventFfi::empty(LifeEventKind::Error)
            },
        };

        // SAFETY: `ffi_event` and the states it borrows outlive the call;
        // the callback contract is the host's, accepted in `life_new`.
        unsafe { callback(&raw const ffi_event, self.user_data.0) };
    }
}
