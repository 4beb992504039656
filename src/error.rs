//! Engine error types

/// Result type for engine operations
pub type Result<T> = core::result::Result<T, EngineError>;

/// Precondition violations reported by the engine
///
/// Degenerate sensor data is never an error: zero readings, ill-conditioned
/// fits and undefined orientations are absorbed inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("engine already started")]
    AlreadyStarted,

    #[error("engine not started")]
    NotStarted,

    #[error("invalid accelerometer sensitivity: {0}")]
    InvalidSensitivity(f32),

    #[error("form factor {index} out of range ({count} configured)")]
    InvalidFormFactor { index: usize, count: usize },

    #[error("axis layout is not a signed permutation matrix")]
    InvalidLayout,
}
