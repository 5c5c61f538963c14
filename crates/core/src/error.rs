//! Error taxonomy for the compute engine
//!
//! Construction and caller-side validation errors are returned synchronously.
//! Errors raised on an engine's worker thread travel back through
//! [`LifeEvent::Error`](crate::simulation::LifeEvent::Error) instead.

use thiserror::Error;

/// Errors produced by board construction, cell access and backend selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifeError {
    /// Width or height is zero, or the board is smaller than 1×2
    #[error("invalid board dimensions {width}x{height}: both must be > 0 and sum to at least 3")]
    InvalidDimensions {
        /// Requested width in cells
        width: u32,
        /// Requested height in cells
        height: u32,
    },

    /// Cell position outside `[0, width*height)`
    #[error("cell position {position} out of range for a board of {cell_count} cells")]
    OutOfRange {
        /// Offending linear position
        position: usize,
        /// Number of cells on the board
        cell_count: usize,
    },

    /// The requested backend cannot run in the current environment
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// A command was posted after the engine's worker exited
    #[error("compute engine is no longer running")]
    EngineStopped,

    /// A generation buffer does not match the board it claims to describe
    #[error("snapshot holds {actual} cells, expected {expected}")]
    SnapshotLengthMismatch {
        /// `width * height` of the target board
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },
}
