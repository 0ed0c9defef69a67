//! The Trajectory Store - decoded vehicle poses plus the tick rate.
//!
//! A [`Trajectory`] is created once per run when the payload is decoded and
//! is never mutated afterwards. Sample `i` represents simulated time
//! `i / tick_rate` seconds.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// A single vehicle pose in simulation space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in simulation units
    pub position: Point2<f64>,

    /// Heading, anticlockwise from +x, in radians
    pub heading: f64,

    /// Speed in simulation units per tick
    pub speed: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64, speed: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            heading,
            speed,
        }
    }
}

/// The immutable, fixed-rate sequence of poses for one run.
///
/// Deserializing goes through [`Trajectory::new`], so every instance is
/// non-empty with a positive tick rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrajectory")]
pub struct Trajectory {
    samples: Vec<Pose>,
    tick_rate: u32,
}

/// Unchecked serde shape of [`Trajectory`].
#[derive(Deserialize)]
struct RawTrajectory {
    samples: Vec<Pose>,
    tick_rate: i64,
}

impl TryFrom<RawTrajectory> for Trajectory {
    type Error = ReplayError;

    fn try_from(raw: RawTrajectory) -> Result<Self, Self::Error> {
        Trajectory::new(raw.samples, raw.tick_rate)
    }
}

impl Trajectory {
    /// Creates a trajectory, rejecting empty sample sets and non-positive
    /// tick rates.
    pub fn new(samples: Vec<Pose>, tick_rate: i64) -> Result<Self, ReplayError> {
        if samples.is_empty() {
            return Err(ReplayError::EmptyTrajectory);
        }
        if tick_rate <= 0 || tick_rate > u32::MAX as i64 {
            return Err(ReplayError::InvalidTickRate(tick_rate));
        }

        Ok(Self {
            samples,
            tick_rate: tick_rate as u32,
        })
    }

    /// Re-checks the construction invariants.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.samples.is_empty() {
            return Err(ReplayError::EmptyTrajectory);
        }
        if self.tick_rate == 0 {
            return Err(ReplayError::InvalidTickRate(0));
        }
        Ok(())
    }

    pub fn samples(&self) -> &[Pose] {
        &self.samples
    }

    /// Samples per second of simulated time.
    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a validated trajectory.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }

    /// The reference pose for coordinate mapping.
    pub fn first(&self) -> &Pose {
        &self.samples[0]
    }

    pub fn last(&self) -> &Pose {
        &self.samples[self.last_index()]
    }

    /// Absolute headings in sample order.
    pub fn headings(&self) -> Vec<f64> {
        self.samples.iter().map(|p| p.heading).collect()
    }

    /// Simulated time of sample `index`, in seconds.
    pub fn sample_time(&self, index: usize) -> f64 {
        index as f64 / self.tick_rate as f64
    }

    /// Simulated time of the final sample.
    pub fn duration_secs(&self) -> f64 {
        self.sample_time(self.last_index())
    }
}

/// The result of a run, paired 1:1 with a [`Trajectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub succeeded: bool,

    /// Only meaningful when `succeeded` is true
    pub elapsed_ticks: i64,
}

impl Outcome {
    pub fn finished(elapsed_ticks: i64) -> Self {
        Self {
            succeeded: true,
            elapsed_ticks,
        }
    }

    pub fn crashed(elapsed_ticks: i64) -> Self {
        Self {
            succeeded: false,
            elapsed_ticks,
        }
    }
}

// =============================================================================
// WIRE PAYLOAD
// =============================================================================

/// `{x, y}` as emitted by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

/// One car state from the simulator's history.
///
/// The simulator also emits its car limits (`max_speed`, `max_acc`, ...);
/// those are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireCar {
    pub pos: WirePoint,
    pub angle: f64,
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireHistory {
    pub history: Vec<WireCar>,
    pub tps: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireScore {
    pub successful: bool,
    pub time: i64,
}

/// The full response to a code submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunPayload {
    pub history: WireHistory,
    pub score: WireScore,
}

impl RunPayload {
    /// Decodes the raw JSON body of a run response.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Converts the wire shape into the engine's inputs.
    pub fn into_run(self) -> Result<(Trajectory, Outcome), ReplayError> {
        let samples = self
            .history
            .history
            .iter()
            .map(|car| Pose::new(car.pos.x, car.pos.y, car.angle, car.speed))
            .collect();

        let trajectory = Trajectory::new(samples, self.history.tps)?;
        let outcome = Outcome {
            succeeded: self.score.successful,
            elapsed_ticks: self.score.time,
        };

        Ok((trajectory, outcome))
    }
}
