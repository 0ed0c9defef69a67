//! Scenario runner - replays synthetic runs under hostile frame timing.

use crate::context::SimContext;
use crate::exporter::ReplayExport;
use crate::oracle::{Oracle, OracleConfig};
use crate::scenarios::{FrameTimer, ScenarioId};
use crate::source::SimRunSource;

use nalgebra::Point2;
use replay_core::{
    Outcome, OutcomeRouter, PlaybackConfig, Presentation, RecordedTransitions, ReplayController,
    ReplaySession, RouteDecision, SessionError, Trajectory,
};
use replay_env::{EnvError, RunRequest};
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hard stop for a replay loop that never finishes.
const MAX_FRAMES: u64 = 1_000_000;

/// Slack for float comparisons on positions and times.
const EPSILON: f64 = 1e-9;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Frames rendered, including the finishing frame
    pub frames: u64,

    /// Samples in the replayed trajectory
    pub samples: usize,

    /// Playback time when the replay finished
    pub playback_secs: f64,

    /// Earliest time the replay could have finished
    pub completion_secs: f64,

    /// Routed outcome, if the replay finished
    pub route: Option<RouteDecision>,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Largest per-frame rotation, in radians
    pub max_rotation_delta: f64,

    /// Times the source headings jumped across ±π
    pub seam_crossings: usize,

    /// Largest displacement in a single non-final frame
    pub max_frame_step: f64,

    /// Virtual time spent waiting on the run source (session only)
    pub network_secs: f64,
}

/// What one replay loop observed.
struct PlaybackTrace {
    frames: u64,
    elapsed_before_finish: f64,
    playback_secs: f64,
    failure: Option<String>,
}

/// Host frame rate used unless overridden.
pub const DEFAULT_FPS: f64 = 60.0;

/// Runs replay scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Host frame rate for frame-driven scenarios
    fps: f64,

    /// Tick rate of generated runs in Hz
    tick_rate: u32,

    /// Playback tuning
    config: PlaybackConfig,

    /// Where sample 0 is drawn
    display_origin: Point2<f64>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fps: DEFAULT_FPS,
            tick_rate: OracleConfig::default().tick_rate,
            config: PlaybackConfig::default(),
            display_origin: Point2::new(-7.4, 0.3),
        }
    }

    /// Sets the host frame rate.
    ///
    /// Non-finite or non-positive rates are ignored and the previous rate
    /// is kept.
    pub fn with_fps(mut self, fps: f64) -> Self {
        if fps.is_finite() && fps > 0.0 {
            self.fps = fps;
        } else {
            warn!("Ignoring invalid frame rate {}, keeping {}", fps, self.fps);
        }
        self
    }

    /// Sets the tick rate of generated runs.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate = hz;
        self
    }

    /// Sets the playback configuration.
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with_export(scenario).0
    }

    /// Runs a scenario, also returning every rendered frame.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, ReplayExport) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let mut export = ReplayExport::new(scenario.name(), self.seed);
        let result = match scenario {
            ScenarioId::Session => self.run_session(),
            ScenarioId::SingleSample => self.run_single_sample(&mut export),
            _ => self.run_frames(scenario, &mut export),
        };

        export.finalize(result.passed, result.route);
        if !result.passed {
            warn!(
                "{} failed: {}",
                scenario.name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
        (result, export)
    }

    fn oracle_config(&self, scenario: ScenarioId) -> OracleConfig {
        scenario.oracle_config(OracleConfig {
            tick_rate: self.tick_rate,
            ..Default::default()
        })
    }

    /// RPL-001..006: generate a run, replay it frame by frame, check it.
    fn run_frames(&self, scenario: ScenarioId, export: &mut ReplayExport) -> ScenarioResult {
        let mut oracle = Oracle::new(self.seed, self.oracle_config(scenario));
        let payload = oracle.simulate();
        let seam_crossings = payload
            .history
            .history
            .windows(2)
            .filter(|w| (w[1].angle - w[0].angle).abs() > PI)
            .count();

        let (trajectory, outcome) = match payload.into_run() {
            Ok(run) => run,
            Err(e) => return self.failed(scenario, format!("oracle produced a bad run: {}", e)),
        };
        debug!(
            "Run: {} samples, successful={}, {} seam crossings",
            trajectory.len(),
            outcome.succeeded,
            seam_crossings
        );

        let mut metrics = ScenarioMetrics {
            seam_crossings,
            ..Default::default()
        };
        let mut result = self.replay(scenario, trajectory, outcome, &mut metrics, export);
        result.metrics = metrics;

        if result.passed {
            if let Some(reason) = self.check_scenario(scenario, &result) {
                result.passed = false;
                result.failure_reason = Some(reason);
            }
        }
        result
    }

    /// Scenario-specific assertions on top of the common replay checks.
    fn check_scenario(&self, scenario: ScenarioId, result: &ScenarioResult) -> Option<String> {
        match scenario {
            ScenarioId::HeadingWrap => {
                if result.metrics.seam_crossings == 0 {
                    return Some("run never crossed the ±π seam".to_string());
                }
                if result.metrics.max_rotation_delta > PI {
                    return Some(format!(
                        "rotated {:.3} rad in one frame",
                        result.metrics.max_rotation_delta
                    ));
                }
                None
            }
            ScenarioId::Crash => match result.route {
                Some(RouteDecision {
                    presentation: Presentation::Crashed,
                    display_seconds: None,
                }) => None,
                other => Some(format!("expected crashed route, got {:?}", other)),
            },
            _ => None,
        }
    }

    /// RPL-007: a one-sample run ends on the very first frame.
    fn run_single_sample(&self, export: &mut ReplayExport) -> ScenarioResult {
        let scenario = ScenarioId::SingleSample;
        let mut payload = Oracle::new(self.seed, self.oracle_config(scenario)).simulate();
        payload.history.history.truncate(1);

        let trajectory = match payload.into_run() {
            Ok((trajectory, _)) => trajectory,
            Err(e) => return self.failed(scenario, e.to_string()),
        };

        let mut metrics = ScenarioMetrics::default();
        let mut result = self.replay(scenario, trajectory, Outcome::finished(0), &mut metrics, export);
        result.metrics = metrics;

        if result.passed && result.frames != 1 {
            result.passed = false;
            result.failure_reason = Some(format!("took {} frames to finish", result.frames));
        }
        result
    }

    /// Plays `trajectory` with the scenario's frame pattern and applies the
    /// checks every replay must pass.
    fn replay(
        &self,
        scenario: ScenarioId,
        trajectory: Trajectory,
        outcome: Outcome,
        metrics: &mut ScenarioMetrics,
        export: &mut ReplayExport,
    ) -> ScenarioResult {
        let samples = trajectory.len();
        let tick_rate = trajectory.tick_rate();
        let completion_secs = trajectory.duration_secs();
        let expected_route = OutcomeRouter::route(&outcome, tick_rate);

        let mut controller = ReplayController::new(self.config, RecordedTransitions::new());
        if let Err(e) = controller.load(trajectory, outcome, self.display_origin) {
            return self.failed(scenario, format!("load failed: {}", e));
        }
        export.set_run(tick_rate, completion_secs, controller.waypoints());

        let pattern = scenario.frame_pattern(self.fps);
        let mut timer = FrameTimer::new(pattern, self.seed);
        let trace = self.drive(&mut controller, &mut timer, metrics, export);

        let mut failure = trace.failure;

        // Finishing frame must be the first one at or past completion
        if failure.is_none()
            && trace.frames > 1
            && trace.elapsed_before_finish * tick_rate as f64 >= (samples - 1) as f64
        {
            failure = Some(format!(
                "still playing at {:.4}s, past completion at {:.4}s",
                trace.elapsed_before_finish, completion_secs
            ));
        }
        if failure.is_none() && trace.playback_secs > completion_secs + pattern.max_dt() + EPSILON {
            failure = Some(format!(
                "finished at {:.4}s, more than one frame after {:.4}s",
                trace.playback_secs, completion_secs
            ));
        }

        if failure.is_none() {
            let last = controller.waypoints()[samples - 1].position;
            let at = controller.state().display_position;
            if (at - last).norm() > EPSILON {
                failure = Some(format!(
                    "ended at ({:.3}, {:.3}), last waypoint is ({:.3}, {:.3})",
                    at.x, at.y, last.x, last.y
                ));
            }
        }

        if failure.is_none() && controller.step(1.0 / self.fps).is_some() {
            failure = Some("controller kept producing frames after finishing".to_string());
        }

        let transitions = controller.sink().count();
        if failure.is_none() && transitions != 1 {
            failure = Some(format!("scene transition fired {} times", transitions));
        }

        let route = controller.route().copied();
        if failure.is_none() && route != Some(expected_route) {
            failure = Some(format!("routed {:?}, expected {:?}", route, expected_route));
        }

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure.is_none(),
            frames: trace.frames,
            samples,
            playback_secs: trace.playback_secs,
            completion_secs,
            route,
            failure_reason: failure,
            metrics: ScenarioMetrics::default(),
        }
    }

    /// Steps `controller` until it finishes, checking each frame.
    fn drive(
        &self,
        controller: &mut ReplayController<RecordedTransitions>,
        timer: &mut FrameTimer,
        metrics: &mut ScenarioMetrics,
        export: &mut ReplayExport,
    ) -> PlaybackTrace {
        let tick_rate = controller.trajectory().map(|t| t.tick_rate()).unwrap_or(1) as f64;
        let last_index = controller.waypoints().len().saturating_sub(1);
        let units_per_tick = controller.config().units_per_tick;

        let mut trace = PlaybackTrace {
            frames: 0,
            elapsed_before_finish: 0.0,
            playback_secs: 0.0,
            failure: None,
        };
        let mut previous_index = 0;
        let mut previous_position = controller.state().display_position;

        while trace.frames < MAX_FRAMES {
            let dt = timer.next_dt();
            let before = controller.state().elapsed_secs;
            let Some(frame) = controller.step(dt) else {
                trace.failure = Some("controller stopped without finishing".to_string());
                return trace;
            };
            trace.frames += 1;
            export.add_frame(controller.state().elapsed_secs, &frame);

            if frame.index < previous_index || frame.index > last_index {
                trace.failure = Some(format!(
                    "index went from {} to {} (last {})",
                    previous_index, frame.index, last_index
                ));
                return trace;
            }
            previous_index = frame.index;

            metrics.max_rotation_delta = metrics.max_rotation_delta.max(frame.rotation_delta.abs());

            if frame.finished {
                trace.elapsed_before_finish = before;
                trace.playback_secs = controller.state().elapsed_secs;
                debug!(
                    "Finished on frame {} at {:.4}s",
                    trace.frames, trace.playback_secs
                );
                return trace;
            }

            let step = (frame.position - previous_position).norm();
            let cap = units_per_tick * tick_rate * dt;
            if step > cap + EPSILON {
                trace.failure = Some(format!(
                    "moved {:.4} in one frame, cap is {:.4}",
                    step, cap
                ));
                return trace;
            }
            metrics.max_frame_step = metrics.max_frame_step.max(step);
            previous_position = frame.position;
        }

        trace.failure = Some(format!("no finish after {} frames", MAX_FRAMES));
        trace
    }

    /// RPL-008: submit through the async session against the simulated
    /// source, play on the virtual clock, then read the leaderboard back.
    fn run_session(&self) -> ScenarioResult {
        let scenario = ScenarioId::Session;
        let runtime = match tokio::runtime::Builder::new_current_thread().build() {
            Ok(rt) => rt,
            Err(e) => return self.failed(scenario, format!("runtime: {}", e)),
        };

        let latency = Duration::from_millis(200);
        let context = SimContext::shared();
        let oracle = Oracle::new(self.seed, self.oracle_config(scenario));
        let source = Arc::new(SimRunSource::new(context.clone(), oracle, latency));
        let session = ReplaySession::new(context.clone(), source.clone(), self.config, self.display_origin);
        let frame_interval = Duration::from_secs_f64(1.0 / self.fps);

        runtime.block_on(async {
            let rejected = session
                .submit(RunRequest::new("sim", "  "), RecordedTransitions::new())
                .await;
            if !matches!(rejected, Err(SessionError::Env(EnvError::Rejected(_)))) {
                return self.failed(scenario, "empty submission was not rejected".to_string());
            }

            let submitted_at = context.time_ns();
            let mut replay = match session
                .submit(RunRequest::new("sim", "steer(0.1)"), RecordedTransitions::new())
                .await
            {
                Ok(replay) => replay,
                Err(e) => return self.failed(scenario, format!("submit failed: {}", e)),
            };
            let network_secs = Duration::from_nanos(context.time_ns() - submitted_at).as_secs_f64();

            let samples = replay.waypoints().len();
            let completion_secs = replay.trajectory().map(|t| t.duration_secs()).unwrap_or(0.0);
            let summary = session.play(&mut replay, frame_interval).await;

            let mut failure = None;
            if !summary.finished {
                failure = Some("playback loop ended before finishing".to_string());
            } else if summary.wall_secs + EPSILON < completion_secs {
                failure = Some(format!(
                    "finished after {:.4}s of virtual time, before {:.4}s",
                    summary.wall_secs, completion_secs
                ));
            } else if replay.sink().count() != 1 {
                failure = Some(format!("scene transition fired {} times", replay.sink().count()));
            }

            if failure.is_none() {
                match session.leaderboard(10).await {
                    Ok(board) if board.len() == 1 => {}
                    Ok(board) => {
                        failure = Some(format!("leaderboard has {} entries, expected 1", board.len()))
                    }
                    Err(e) => failure = Some(format!("leaderboard failed: {}", e)),
                }
            }

            ScenarioResult {
                scenario,
                seed: self.seed,
                passed: failure.is_none(),
                frames: summary.frames,
                samples,
                playback_secs: summary.wall_secs,
                completion_secs,
                route: replay.route().copied(),
                failure_reason: failure,
                metrics: ScenarioMetrics {
                    network_secs,
                    ..Default::default()
                },
            }
        })
    }

    fn failed(&self, scenario: ScenarioId, reason: String) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: false,
            frames: 0,
            samples: 0,
            playback_secs: 0.0,
            completion_secs: 0.0,
            route: None,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }
}
