//! Simulated run source with virtual latency.

use async_trait::async_trait;
use replay_core::leaderboard::{Leaderboard, LeaderboardEntry, Score};
use replay_env::{EnvError, ReplayContext, RunRequest, RunSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::context::SimContext;
use crate::oracle::Oracle;

/// A `RunSource` backed by the [`Oracle`].
///
/// Each submission suspends for `latency` of virtual time, then resolves
/// with a freshly simulated run. Every run is also recorded on an
/// in-memory leaderboard, as the real service does.
pub struct SimRunSource {
    context: Arc<SimContext>,
    oracle: Mutex<Oracle>,
    latency: Duration,
    entries: Mutex<Vec<LeaderboardEntry>>,
}

impl SimRunSource {
    pub fn new(context: Arc<SimContext>, oracle: Oracle, latency: Duration) -> Self {
        Self {
            context,
            oracle: Mutex::new(oracle),
            latency,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Number of runs recorded so far.
    pub fn submissions(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl RunSource for SimRunSource {
    async fn submit(&self, request: RunRequest) -> Result<String, EnvError> {
        self.context.sleep(self.latency).await;

        if request.source_code.trim().is_empty() {
            return Err(EnvError::rejected("empty source"));
        }

        let payload = self.oracle.lock().unwrap().simulate();
        let json = payload
            .to_json()
            .map_err(|e| EnvError::network(e.to_string()))?;

        self.entries.lock().unwrap().push(LeaderboardEntry {
            username: request.username,
            score: Score {
                successful: payload.score.successful,
                time: payload.score.time,
            },
            source: Some(request.source_code),
        });

        Ok(json)
    }

    async fn leaderboard(&self, n: usize) -> Result<String, EnvError> {
        self.context.sleep(self.latency).await;

        let board = Leaderboard::new(self.entries.lock().unwrap().clone());
        let top: Vec<&LeaderboardEntry> = board.top_n(n).collect();
        serde_json::to_string(&top).map_err(|e| EnvError::network(e.to_string()))
    }
}
