//! Error types for availability-engine operations.

use thiserror::Error;

use crate::policy::PolicyViolation;

/// Opaque error type used by the injected data-access collaborators.
/// Fetch and persistence failures propagate through the engine as-is.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// An interval was malformed or inverted after normalization.
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    /// The target day could not be anchored to a valid instant in the
    /// reference timezone.
    #[error("invalid day anchor: {0}")]
    InvalidDay(String),

    /// A precondition failed before any computation ran. Never retried.
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    /// A data-access collaborator (fetch or persist) failed.
    #[error("data access failure: {0}")]
    DataAccess(#[source] BoxError),
}

/// Convenience alias used throughout gather-engine.
pub type Result<T> = std::result::Result<T, EngineError>;
