//! Core environment context trait for replay hosts.

use async_trait::async_trait;
use std::time::Duration;

/// The interface for time as seen by the replay engine.
///
/// Abstracts the "real world" clock so the same playback loop runs against
/// a wall clock in production and a manually advanced clock in simulation.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `Instant` and `tokio::time`
/// - **Simulation**: `SimContext` - virtual nanosecond counter
#[async_trait]
pub trait ReplayContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// The playback loop feeds differences of this value into
    /// `ReplayController::step`.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);
}
