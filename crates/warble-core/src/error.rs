//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A component was constructed with parameters it cannot run with.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Levinson recursion hit a zero or non-finite pivot.
    #[error("Singular Toeplitz system at order {order}")]
    SingularToeplitz {
        /// Recursion step at which the pivot vanished.
        order: usize,
    },

    /// Slice lengths disagree with what the operation expects.
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidConfig`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
