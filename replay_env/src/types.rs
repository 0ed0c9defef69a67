//! Common types for the replay environment abstraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a single submitted run.
///
/// Each submission gets a fresh id so log lines from the fetch, the load
/// and the replay of one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Creates a new random RunId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic RunId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A code submission as sent to the remote simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Display name the run is ranked under
    pub username: String,

    /// The user's driving-control source code
    pub source_code: String,
}

impl RunRequest {
    pub fn new(username: impl Into<String>, source_code: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            source_code: source_code.into(),
        }
    }

    /// Returns the source size in bytes.
    pub fn source_len(&self) -> usize {
        self.source_code.len()
    }
}
