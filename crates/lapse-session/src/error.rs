//! Error types for session store operations.

/// Failure reported by an [`IdGenerator`](crate::IdGenerator).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct IdGenerationError {
    message: String,
}

impl IdGenerationError {
    /// Create a new error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The generator's failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session was never created or has already been evicted.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The identifier generator failed. Not retried.
    #[error("Session ID generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),
}

impl Error {
    /// Whether this is the expected "no such session" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
