//! Replay Session - fetch, decode, load and play one run.
//!
//! This is the integration layer between the pure replay engine and the
//! environment abstraction. The network call is awaited; the controller is
//! only built once the payload has fully arrived, and each run gets a fresh
//! controller. Nothing here is global.
//!
//! # Usage
//!
//! ```ignore
//! use replay_core::session::ReplaySession;
//! use replay_env::{RunRequest, TokioContext};
//!
//! let session = ReplaySession::new(TokioContext::shared(), source, PlaybackConfig::default(), origin);
//! let mut replay = session.submit(RunRequest::new("alice", code), |d: &RouteDecision| show(d)).await?;
//! session.play(&mut replay, Duration::from_millis(16)).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use nalgebra::Point2;
use replay_env::{ReplayContext, RunId, RunRequest, RunSource};
use tracing::{debug, info};

use crate::controller::{PlaybackConfig, ReplayController};
use crate::error::SessionError;
use crate::leaderboard::Leaderboard;
use crate::outcome::SceneTransition;
use crate::trajectory::RunPayload;

/// Summary of a completed (or aborted) playback loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSummary {
    /// Frames rendered, including the finishing frame
    pub frames: u64,

    /// Wall time spent in the loop, in seconds
    pub wall_secs: f64,

    /// Whether the replay reached `Finished`
    pub finished: bool,
}

/// Binds a clock and a run source for a sequence of replays.
pub struct ReplaySession<Ctx, Src>
where
    Ctx: ReplayContext,
    Src: RunSource,
{
    context: Arc<Ctx>,
    source: Arc<Src>,
    config: PlaybackConfig,
    display_origin: Point2<f64>,
}

impl<Ctx, Src> ReplaySession<Ctx, Src>
where
    Ctx: ReplayContext,
    Src: RunSource,
{
    pub fn new(
        context: Arc<Ctx>,
        source: Arc<Src>,
        config: PlaybackConfig,
        display_origin: Point2<f64>,
    ) -> Self {
        Self {
            context,
            source,
            config,
            display_origin,
        }
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    /// Submits code and returns a controller already playing the result.
    ///
    /// Suspends until the run source resolves.
    pub async fn submit<S>(
        &self,
        request: RunRequest,
        sink: S,
    ) -> Result<ReplayController<S>, SessionError>
    where
        S: SceneTransition,
    {
        let run_id = RunId::new();
        debug!(
            "[{}] Submitting {} bytes for {}",
            run_id,
            request.source_len(),
            request.username
        );

        let json = self.source.submit(request).await?;
        let (trajectory, outcome) = RunPayload::from_json(&json)?.into_run()?;
        debug!("[{}] Received {} samples", run_id, trajectory.len());

        let mut controller = ReplayController::new(self.config, sink);
        controller.load(trajectory, outcome, self.display_origin)?;
        Ok(controller)
    }

    /// Drives `controller` from the context clock until it stops playing.
    ///
    /// Each iteration sleeps `frame_interval`, then steps by however much
    /// time actually passed, so a slow host still finishes on schedule.
    pub async fn play<S>(
        &self,
        controller: &mut ReplayController<S>,
        frame_interval: Duration,
    ) -> PlaybackSummary
    where
        S: SceneTransition,
    {
        let start = self.context.now();
        let mut last = start;
        let mut frames = 0;

        loop {
            self.context.sleep(frame_interval).await;
            let now = self.context.now();
            let dt = now.saturating_sub(last).as_secs_f64();
            last = now;

            match controller.step(dt) {
                Some(frame) => {
                    frames += 1;
                    if frame.finished {
                        break;
                    }
                }
                None => break,
            }
        }

        let summary = PlaybackSummary {
            frames,
            wall_secs: last.saturating_sub(start).as_secs_f64(),
            finished: controller.is_finished(),
        };
        info!(
            "Playback loop ended after {} frames ({:.2}s)",
            summary.frames, summary.wall_secs
        );
        summary
    }

    /// Fetches and ranks the top `n` entries.
    pub async fn leaderboard(&self, n: usize) -> Result<Leaderboard, SessionError> {
        let json = self.source.leaderboard(n).await?;
        Ok(Leaderboard::from_json(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplayError;
    use crate::mapper::DisplayScale;
    use crate::outcome::{Presentation, RecordedTransitions};
    use async_trait::async_trait;
    use replay_env::EnvError;
    use std::sync::Mutex;

    /// Clock that only moves when slept on.
    struct ManualContext {
        now: Mutex<Duration>,
    }

    impl ManualContext {
        fn shared() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Duration::ZERO),
            })
        }
    }

    #[async_trait]
    impl ReplayContext for ManualContext {
        fn now(&self) -> Duration {
            *self.now.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            *self.now.lock().unwrap() += duration;
        }
    }

    /// Source that answers every submission with the same body.
    struct CannedSource {
        run: Result<String, String>,
        board: String,
    }

    #[async_trait]
    impl RunSource for CannedSource {
        async fn submit(&self, _request: RunRequest) -> Result<String, EnvError> {
            self.run.clone().map_err(EnvError::rejected)
        }

        async fn leaderboard(&self, _n: usize) -> Result<String, EnvError> {
            Ok(self.board.clone())
        }
    }

    const RUN: &str = r#"{
        "history": {
            "history": [
                {"pos": {"x": 0.0, "y": 0.0}, "angle": 0.0, "speed": 0.0},
                {"pos": {"x": 1.0, "y": 0.0}, "angle": 0.0, "speed": 1.0},
                {"pos": {"x": 2.0, "y": 0.0}, "angle": 0.0, "speed": 1.0},
                {"pos": {"x": 3.0, "y": 0.0}, "angle": 0.0, "speed": 1.0},
                {"pos": {"x": 4.0, "y": 0.0}, "angle": 0.0, "speed": 1.0}
            ],
            "tps": 8
        },
        "score": {"successful": true, "time": 4}
    }"#;

    fn session(run: Result<String, String>) -> ReplaySession<ManualContext, CannedSource> {
        let source = Arc::new(CannedSource {
            run,
            board: r#"[{"username": "a", "score": {"successful": true, "time": 4}}]"#.to_string(),
        });
        let config = PlaybackConfig {
            display_scale: DisplayScale::identity(),
            ..Default::default()
        };
        ReplaySession::new(ManualContext::shared(), source, config, Point2::origin())
    }

    #[tokio::test]
    async fn test_submit_then_play_to_finish() {
        let session = session(Ok(RUN.to_string()));
        let mut replay = session
            .submit(RunRequest::new("alice", "drive()"), RecordedTransitions::new())
            .await
            .unwrap();

        let summary = session.play(&mut replay, Duration::from_millis(125)).await;

        assert!(summary.finished);
        // 0.5s of playback at 125ms per frame
        assert_eq!(summary.frames, 4);
        assert_eq!(replay.sink().count(), 1);
        assert_eq!(replay.route().unwrap().presentation, Presentation::Finished);
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let session = session(Err("syntax error".to_string()));
        let err = session
            .submit(RunRequest::new("bob", "drive("), RecordedTransitions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Env(EnvError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_empty_history_is_a_replay_error() {
        let body = r#"{"history": {"history": [], "tps": 10}, "score": {"successful": false, "time": 0}}"#;
        let session = session(Ok(body.to_string()));
        let err = session
            .submit(RunRequest::new("carol", "x"), RecordedTransitions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Replay(ReplayError::EmptyTrajectory)));
    }

    #[tokio::test]
    async fn test_leaderboard_fetch() {
        let session = session(Ok(RUN.to_string()));
        let board = session.leaderboard(10).await.unwrap();
        assert_eq!(board.len(), 1);
    }
}
