//! Error types for the replay engine.

use replay_env::EnvError;
use thiserror::Error;

/// Conditions that stop a trajectory from being loaded.
///
/// Inputs are validated by the decode layer, so the taxonomy is narrow:
/// only the shape checks the controller needs to avoid out-of-bounds access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReplayError {
    /// A trajectory with zero samples was supplied
    #[error("Trajectory has no samples")]
    EmptyTrajectory,

    /// Tick rate must be strictly positive
    #[error("Invalid tick rate: {0}")]
    InvalidTickRate(i64),

    /// The run payload could not be decoded
    #[error("Payload error: {0}")]
    Payload(String),

    /// Playback configuration could not be read
    #[error("Config error: {0}")]
    Config(String),
}

impl ReplayError {
    /// Creates a payload error.
    pub fn payload(msg: impl std::fmt::Display) -> Self {
        Self::Payload(msg.to_string())
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        Self::payload(e)
    }
}

/// Errors from a replay session (fetch + decode + load).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The run source failed
    #[error(transparent)]
    Env(#[from] EnvError),

    /// The payload decoded but could not be replayed
    #[error(transparent)]
    Replay(#[from] ReplayError),
}
