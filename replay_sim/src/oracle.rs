//! Synthetic run oracle.
//!
//! Stands in for the remote simulator: drives a kinematic car around a
//! rectangular arena and records one pose per tick, producing the same
//! `{history, score}` payload the real service returns.
//!
//! - Speed ramps toward a cap with acceleration that fades near the cap
//! - Steering is a seeded random walk, re-decided every few ticks
//! - Leaving the arena is a crash; covering the target distance finishes

use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use replay_core::angle::normalize_delta;
use replay_core::trajectory::{RunPayload, WireCar, WireHistory, WirePoint, WireScore};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Width of the car, used for the turning circle.
const CAR_WIDTH: f64 = 0.3;

/// Configuration for synthetic runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Samples per simulated second
    pub tick_rate: u32,

    /// Ticks between steering decisions
    pub ticks_per_update: u32,

    /// Runs still going after this many ticks are unsuccessful
    pub tick_limit: u32,

    /// Arena size in simulation units; the car starts in the middle
    pub arena_width: f64,
    pub arena_height: f64,

    /// Distance to cover for a successful run
    pub target_distance: f64,

    /// Top speed in units per second
    pub max_speed: f64,

    /// Standard deviation of each steering adjustment (steering is -1..=1)
    pub steering_noise_std: f64,

    /// Constant steering added to every decision
    pub steering_bias: f64,

    /// Report headings wrapped into (-π, π] rather than accumulated
    pub wrap_headings: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            tick_rate: 100,
            ticks_per_update: 10,
            tick_limit: 60_000,
            arena_width: 60.0,
            arena_height: 60.0,
            target_distance: 30.0,
            max_speed: 10.0,
            steering_noise_std: 0.05,
            steering_bias: 0.0,
            wrap_headings: true,
        }
    }
}

/// Kinematic car state.
#[derive(Debug, Clone, Copy)]
struct CarState {
    position: Point2<f64>,

    /// Accumulated heading in radians
    heading: f64,

    /// Units per tick
    speed: f64,
}

/// The Oracle - seeded generator of complete runs.
pub struct Oracle {
    seed: u64,
    rng: ChaCha8Rng,
    config: OracleConfig,
    runs_generated: u64,
}

impl Oracle {
    /// Creates a new Oracle with the given seed.
    pub fn new(seed: u64, config: OracleConfig) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            runs_generated: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn runs_generated(&self) -> u64 {
        self.runs_generated
    }

    /// Simulates one run from the arena centre, facing down the track.
    pub fn simulate(&mut self) -> RunPayload {
        let cfg = self.config;
        let tick_rate = cfg.tick_rate.max(1) as f64;
        let max_speed = cfg.max_speed / tick_rate;
        let max_acc = 0.5 * max_speed / tick_rate;
        let noise = Normal::new(0.0, cfg.steering_noise_std.max(0.0)).ok();

        let mut car = CarState {
            position: Point2::new(cfg.arena_width / 2.0, cfg.arena_height / 2.0),
            heading: 3.0 * FRAC_PI_2,
            speed: 0.0,
        };
        let mut history = vec![self.record(&car)];
        let mut wander: f64 = 0.0;
        let mut steering = 0.0;
        let mut travelled = 0.0;
        let mut ticks: u32 = 0;

        let successful = loop {
            if ticks >= cfg.tick_limit {
                break false;
            }
            if ticks % cfg.ticks_per_update.max(1) == 0 {
                let kick = noise.map(|n| n.sample(&mut self.rng)).unwrap_or(0.0);
                wander = (wander + kick).clamp(-1.0, 1.0);
                steering = (wander + cfg.steering_bias).clamp(-1.0, 1.0);
            }
            ticks += 1;

            // Acceleration fades linearly to zero at top speed
            let new_speed = (car.speed + (1.0 - car.speed / max_speed) * max_acc).min(max_speed);
            let distance = (car.speed + new_speed) / 2.0;
            car.speed = new_speed;
            advance(&mut car, distance, steering);
            travelled += distance;

            history.push(self.record(&car));

            if !self.inside_arena(car.position) {
                break false;
            }
            if travelled >= cfg.target_distance {
                break true;
            }
        };

        self.runs_generated += 1;

        RunPayload {
            history: WireHistory {
                history,
                tps: cfg.tick_rate as i64,
            },
            score: WireScore {
                successful,
                time: ticks as i64,
            },
        }
    }

    fn record(&self, car: &CarState) -> WireCar {
        let angle = if self.config.wrap_headings {
            wrap_heading(car.heading)
        } else {
            car.heading
        };
        WireCar {
            pos: WirePoint {
                x: car.position.x,
                y: car.position.y,
            },
            angle,
            speed: car.speed,
        }
    }

    fn inside_arena(&self, p: Point2<f64>) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.config.arena_width && p.y <= self.config.arena_height
    }
}

/// Moves the car `distance` along an arc set by `steering`.
///
/// Positive steering turns right (clockwise). The turning circle follows
/// from the wheel angle and car width; the car travels along the chord at
/// the mean heading of the arc.
fn advance(car: &mut CarState, distance: f64, steering: f64) {
    let wheel = steering.clamp(-1.0, 1.0) * FRAC_PI_4;
    let angle_change = -distance * 2.0 * (wheel / 2.0).sin() / CAR_WIDTH;

    let mean_heading = car.heading + angle_change / 2.0;
    car.position += Vector2::new(mean_heading.cos(), mean_heading.sin()) * distance;
    car.heading += angle_change;
}

/// Wraps an absolute heading into (-π, π], as a simulator reporting
/// bounded angles would.
pub fn wrap_heading(angle: f64) -> f64 {
    normalize_delta(angle)
}
