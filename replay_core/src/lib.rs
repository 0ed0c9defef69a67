//! Replay Core - Trajectory Replay Engine
//!
//! Turns a finite, fixed-rate vehicle trajectory from the remote simulator
//! into smooth, frame-rate independent motion on screen:
//! 1. **Space**: simulation coordinates remapped to display coordinates,
//!    anchored on the first sample
//! 2. **Rotation**: absolute headings unwrapped into shortest-arc deltas
//! 3. **Time**: sample index driven by elapsed wall time, not frame count
//! 4. **Ending**: a single, deterministic crashed/finished routing

pub mod trajectory;
pub mod mapper;
pub mod angle;
pub mod waypoint;
pub mod clock;
pub mod controller;
pub mod outcome;
pub mod leaderboard;
pub mod session;
pub mod error;

// Re-export key types for convenience
pub use trajectory::{Outcome, Pose, RunPayload, Trajectory};
pub use mapper::{CoordinateMapper, DisplayScale};
pub use waypoint::DisplayWaypoint;
pub use clock::PlaybackClock;
pub use controller::{PlaybackConfig, ReplayController, ReplayFrame, ReplayPhase, ReplayState};
pub use outcome::{OutcomeRouter, Presentation, RecordedTransitions, RouteDecision, SceneTransition};
pub use leaderboard::{Leaderboard, LeaderboardEntry, Score};
pub use session::{PlaybackSummary, ReplaySession};
pub use error::{ReplayError, SessionError};
