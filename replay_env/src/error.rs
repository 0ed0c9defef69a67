//! Error types for the replay environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Transport failed (connection refused, reset, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// The simulator refused the submitted code (compile error, bad request)
    #[error("Run rejected: {0}")]
    Rejected(String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// The source was shut down before the request completed
    #[error("Run source closed")]
    Closed,
}

impl EnvError {
    /// Creates a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a rejection error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}
