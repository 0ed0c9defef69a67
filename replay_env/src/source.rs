//! Run source abstraction: where trajectories and leaderboards come from.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::RunRequest;

/// Abstraction over the remote simulator and leaderboard service.
///
/// # Implementations
///
/// - **Production**: `HttpRunSource`, the simulator's HTTP API
/// - **Simulation**: `SimRunSource`, a seeded synthetic simulator with
///   virtual latency
///
/// # Request Flow
///
/// ```text
/// Host                      RunSource                   Simulator
///   |                           |                           |
///   |-- submit(req).await ----->|-- POST /run/<user> ------>|
///   |      (suspended)          |                           |
///   |<-- Ok(payload json) ------|<-- history + score -------|
///   |-- load(trajectory) ...    |                           |
/// ```
#[async_trait]
pub trait RunSource: Send + Sync + 'static {
    /// Submits code and resolves once the full run payload is available.
    ///
    /// # Returns
    /// * `Ok(json)` - Raw `{history, score}` payload
    /// * `Err(EnvError::Rejected)` - The simulator refused the code
    /// * `Err(EnvError::Network)` - Transport failure
    async fn submit(&self, request: RunRequest) -> Result<String, EnvError>;

    /// Fetches the top `n` leaderboard entries as a raw JSON array.
    async fn leaderboard(&self, n: usize) -> Result<String, EnvError>;
}
