//! The Replay Controller - per-frame playback state machine.
//!
//! ```text
//!   load() ok          step() .. step()          clock complete
//! Idle ─────────► Playing ──────────────► Playing ─────────────► Finished
//!   ▲                │                                              │
//!   └──── abort() ───┴──────────────────── abort() ─────────────────┘
//! ```
//!
//! Each `step(dt)` advances elapsed playback time, asks the [`PlaybackClock`]
//! for the target sample, and moves the displayed pose toward the point at
//! the same fractional tick time. Motion is capped per frame so bursty frame
//! timing never teleports the vehicle; heading closes a fixed share of its
//! remaining error per tick.
//!
//! # Stopping convention
//!
//! Playback finishes on the first frame whose clock index reaches the final
//! sample, i.e. once elapsed time is at least `(len - 1) / tick_rate`. That
//! frame snaps position and heading to the final waypoint, so the replay
//! always ends converged. Sub-tick convergence is not waited for.

use std::path::Path;

use nalgebra::{Point2, UnitComplex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::angle::accumulate;
use crate::clock::PlaybackClock;
use crate::error::ReplayError;
use crate::mapper::{CoordinateMapper, DisplayScale};
use crate::outcome::{OutcomeRouter, RouteDecision, SceneTransition};
use crate::trajectory::{Outcome, Trajectory};
use crate::waypoint::{build_waypoints, DisplayWaypoint};

/// Tuning for playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Simulation → display calibration
    pub display_scale: DisplayScale,

    /// Maximum display distance covered per tick of playback time
    pub units_per_tick: f64,

    /// Fraction of the remaining heading error closed per tick (0..=1)
    pub rotation_smoothing: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            display_scale: DisplayScale::default(),
            units_per_tick: 1.0,
            rotation_smoothing: 0.5,
        }
    }
}

impl PlaybackConfig {
    /// Reads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReplayError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text).map_err(|e| ReplayError::Config(e.to_string()))
    }
}

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayPhase {
    Idle,
    Playing,
    Finished,
}

/// Mutable playback state, owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplayState {
    /// Highest sample index reached so far
    pub current_index: usize,

    /// Accumulated playback time in seconds
    pub elapsed_secs: f64,

    pub display_position: Point2<f64>,

    /// Continuous (unwrapped) heading in radians
    pub display_heading: f64,
}

impl ReplayState {
    fn at(position: Point2<f64>, heading: f64) -> Self {
        Self {
            current_index: 0,
            elapsed_secs: 0.0,
            display_position: position,
            display_heading: heading,
        }
    }
}

/// What the host renders for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplayFrame {
    /// Sample index the clock resolved for this frame
    pub index: usize,

    pub position: Point2<f64>,

    /// Continuous heading in radians
    pub heading: f64,

    /// Heading change applied during this frame
    pub rotation_delta: f64,

    /// True on the frame that completed playback
    pub finished: bool,
}

impl ReplayFrame {
    /// The heading as a unit rotation, for hosts that want a rotor.
    pub fn rotation(&self) -> UnitComplex<f64> {
        UnitComplex::new(self.heading)
    }
}

/// Everything derived from one `load`.
#[derive(Debug, Clone)]
struct LoadedRun {
    trajectory: Trajectory,
    outcome: Outcome,
    waypoints: Vec<DisplayWaypoint>,

    /// Accumulated heading deltas, relative to the first sample
    heading_profile: Vec<f64>,

    /// Absolute heading of the first sample
    base_heading: f64,

    clock: PlaybackClock,
}

impl LoadedRun {
    fn heading_at(&self, index: usize) -> f64 {
        self.base_heading + self.heading_profile[index]
    }
}

/// Drives playback of one run at a time.
///
/// Generic over the scene sink so the same controller works with a UI
/// callback, a recorder in tests, or the simulation harness.
#[derive(Debug)]
pub struct ReplayController<S>
where
    S: SceneTransition,
{
    config: PlaybackConfig,
    mapper: CoordinateMapper,
    sink: S,
    phase: ReplayPhase,
    run: Option<LoadedRun>,
    state: ReplayState,
    route: Option<RouteDecision>,
}

impl<S> ReplayController<S>
where
    S: SceneTransition,
{
    /// Creates an idle controller.
    pub fn new(config: PlaybackConfig, sink: S) -> Self {
        Self {
            mapper: CoordinateMapper::new(config.display_scale),
            config,
            sink,
            phase: ReplayPhase::Idle,
            run: None,
            state: ReplayState::at(Point2::origin(), 0.0),
            route: None,
        }
    }

    /// Loads a run and starts playing it from sample 0.
    ///
    /// Waypoints are mapped and unwrapped here, once. On error the
    /// controller is left exactly as it was.
    ///
    /// # Arguments
    /// * `trajectory` - Decoded poses and tick rate
    /// * `outcome` - Paired run result
    /// * `display_origin` - Where sample 0 is drawn
    pub fn load(
        &mut self,
        trajectory: Trajectory,
        outcome: Outcome,
        display_origin: Point2<f64>,
    ) -> Result<(), ReplayError> {
        if let Err(e) = trajectory.validate() {
            warn!("Refusing to load trajectory: {}", e);
            return Err(e);
        }

        let waypoints = build_waypoints(&trajectory, &self.mapper, display_origin);
        let deltas: Vec<f64> = waypoints.iter().map(|w| w.heading_delta).collect();
        let run = LoadedRun {
            clock: PlaybackClock::new(trajectory.tick_rate(), trajectory.len()),
            base_heading: trajectory.first().heading,
            heading_profile: accumulate(&deltas),
            waypoints,
            trajectory,
            outcome,
        };

        debug!(
            "Loaded {} samples at {} TPS ({:.2}s of playback)",
            run.trajectory.len(),
            run.trajectory.tick_rate(),
            run.clock.completion_secs()
        );

        self.state = ReplayState::at(run.waypoints[0].position, run.base_heading);
        self.run = Some(run);
        self.route = None;
        self.phase = ReplayPhase::Playing;
        Ok(())
    }

    /// Advances playback by `dt_secs` of wall time.
    ///
    /// Returns `None` unless the controller is `Playing`. Negative or
    /// non-finite deltas count as zero. On the frame that completes
    /// playback the outcome is routed and the scene sink is invoked.
    pub fn step(&mut self, dt_secs: f64) -> Option<ReplayFrame> {
        if self.phase != ReplayPhase::Playing {
            return None;
        }
        let run = self.run.as_ref()?;

        let dt = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };
        let tick_rate = run.clock.tick_rate() as f64;
        let previous_heading = self.state.display_heading;

        self.state.elapsed_secs += dt;
        let elapsed = self.state.elapsed_secs;
        let index = run.clock.target_index(elapsed).max(self.state.current_index);
        self.state.current_index = index;

        let finished = run.clock.is_complete(elapsed);
        if finished {
            let last = run.clock.last_index();
            self.state.display_position = run.waypoints[last].position;
            self.state.display_heading = run.heading_at(last);
        } else {
            // index < last here, so index + 1 is in bounds
            let frac = run.clock.tick_fraction(elapsed);
            let from = &run.waypoints[index];
            let to = &run.waypoints[index + 1];

            let target = from.position + (to.position - from.position) * frac;
            let max_step = self.config.units_per_tick * tick_rate * dt;
            self.state.display_position = move_towards(self.state.display_position, target, max_step);

            let target_heading = run.heading_at(index) + to.heading_delta * frac;
            let alpha = (self.config.rotation_smoothing * tick_rate * dt).clamp(0.0, 1.0);
            self.state.display_heading += (target_heading - self.state.display_heading) * alpha;
        }

        let frame = ReplayFrame {
            index,
            position: self.state.display_position,
            heading: self.state.display_heading,
            rotation_delta: self.state.display_heading - previous_heading,
            finished,
        };

        if finished {
            let decision = OutcomeRouter::route(&run.outcome, run.clock.tick_rate());
            info!(
                "Replay finished after {:.2}s: {}",
                self.state.elapsed_secs,
                decision.label()
            );
            self.phase = ReplayPhase::Finished;
            self.route = Some(decision);
            self.sink.transition(&decision);
        }

        Some(frame)
    }

    /// Whether playback has completed.
    pub fn is_finished(&self) -> bool {
        self.phase == ReplayPhase::Finished
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    /// The routed outcome, once finished.
    pub fn route(&self) -> Option<&RouteDecision> {
        self.route.as_ref()
    }

    /// Display waypoints of the loaded run.
    pub fn waypoints(&self) -> &[DisplayWaypoint] {
        self.run.as_ref().map(|r| r.waypoints.as_slice()).unwrap_or(&[])
    }

    /// The loaded trajectory, if any.
    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.run.as_ref().map(|r| &r.trajectory)
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drops the current run and returns to `Idle`. No transition is fired.
    pub fn abort(&mut self) {
        if self.phase == ReplayPhase::Playing {
            debug!("Replay aborted at index {}", self.state.current_index);
        }
        self.run = None;
        self.route = None;
        self.state = ReplayState::at(Point2::origin(), 0.0);
        self.phase = ReplayPhase::Idle;
    }
}

/// Moves `current` toward `target` by at most `max_step`.
fn move_towards(current: Point2<f64>, target: Point2<f64>, max_step: f64) -> Point2<f64> {
    let offset = target - current;
    let dist = offset.norm();
    if dist <= max_step || dist == 0.0 {
        target
    } else {
        current + offset * (max_step / dist)
    }
}
