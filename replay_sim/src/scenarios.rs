//! Replay scenarios and frame timing patterns.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::oracle::OracleConfig;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// RPL-001: Fixed 60 FPS host
    Steady,

    /// RPL-002: 60 FPS with ±80% per-frame jitter
    Jittery,

    /// RPL-003: Alternating 1ms / 120ms frames
    Bursty,

    /// RPL-004: 5 FPS host, many ticks per frame
    SlowFrames,

    /// RPL-005: Car circling through the ±π seam
    HeadingWrap,

    /// RPL-006: Straight into the wall
    Crash,

    /// RPL-007: Trajectory of a single sample
    SingleSample,

    /// RPL-008: Submit → play → leaderboard through the async session
    Session,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Steady,
            ScenarioId::Jittery,
            ScenarioId::Bursty,
            ScenarioId::SlowFrames,
            ScenarioId::HeadingWrap,
            ScenarioId::Crash,
            ScenarioId::SingleSample,
            ScenarioId::Session,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Steady => "steady",
            ScenarioId::Jittery => "jittery",
            ScenarioId::Bursty => "bursty",
            ScenarioId::SlowFrames => "slow_frames",
            ScenarioId::HeadingWrap => "heading_wrap",
            ScenarioId::Crash => "crash",
            ScenarioId::SingleSample => "single_sample",
            ScenarioId::Session => "session",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Steady => "Fixed 60 FPS, replay must end on the last waypoint",
            ScenarioId::Jittery => "60 FPS with heavy jitter, same termination bound",
            ScenarioId::Bursty => "Alternating tiny and huge frames, no teleporting past the end",
            ScenarioId::SlowFrames => "5 FPS, many samples resolved per frame",
            ScenarioId::HeadingWrap => "Circling car, rotation never takes the long way",
            ScenarioId::Crash => "Crashed run routes to 'crashed' with no time",
            ScenarioId::SingleSample => "One-sample trajectory finishes on the first frame",
            ScenarioId::Session => "Async submit, virtual-clock playback and leaderboard",
        }
    }

    /// Frame timing used when replaying this scenario.
    pub fn frame_pattern(&self, fps: f64) -> FramePattern {
        match self {
            ScenarioId::Jittery => FramePattern::Jittery { fps, jitter: 0.8 },
            ScenarioId::Bursty => FramePattern::Bursty {
                short_secs: 0.001,
                long_secs: 0.120,
            },
            ScenarioId::SlowFrames => FramePattern::Steady { fps: 5.0 },
            _ => FramePattern::Steady { fps },
        }
    }

    /// Oracle settings that produce the run this scenario needs.
    pub fn oracle_config(&self, base: OracleConfig) -> OracleConfig {
        match self {
            ScenarioId::HeadingWrap => OracleConfig {
                steering_noise_std: 0.0,
                steering_bias: 0.2,
                wrap_headings: true,
                ..base
            },
            ScenarioId::Crash => OracleConfig {
                arena_width: 8.0,
                arena_height: 8.0,
                steering_noise_std: 0.0,
                steering_bias: 0.0,
                ..base
            },
            _ => base,
        }
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steady" => Ok(ScenarioId::Steady),
            "jittery" => Ok(ScenarioId::Jittery),
            "bursty" => Ok(ScenarioId::Bursty),
            "slow_frames" | "slowframes" => Ok(ScenarioId::SlowFrames),
            "heading_wrap" | "headingwrap" => Ok(ScenarioId::HeadingWrap),
            "crash" => Ok(ScenarioId::Crash),
            "single_sample" | "singlesample" => Ok(ScenarioId::SingleSample),
            "session" => Ok(ScenarioId::Session),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

/// How a host's frame deltas are distributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePattern {
    Steady { fps: f64 },

    /// Each frame is `1/fps * (1 ± jitter)`, uniformly
    Jittery { fps: f64, jitter: f64 },

    /// Alternates a short and a long frame
    Bursty { short_secs: f64, long_secs: f64 },
}

impl FramePattern {
    /// Longest frame this pattern can produce.
    pub fn max_dt(&self) -> f64 {
        match *self {
            FramePattern::Steady { fps } => 1.0 / fps,
            FramePattern::Jittery { fps, jitter } => (1.0 + jitter.abs()) / fps,
            FramePattern::Bursty { short_secs, long_secs } => short_secs.max(long_secs),
        }
    }
}

/// Deterministic source of frame deltas.
pub struct FrameTimer {
    pattern: FramePattern,
    rng: ChaCha8Rng,
    frame: u64,
}

impl FrameTimer {
    pub fn new(pattern: FramePattern, seed: u64) -> Self {
        Self {
            pattern,
            rng: ChaCha8Rng::seed_from_u64(seed),
            frame: 0,
        }
    }

    /// Returns the next frame's delta in seconds.
    pub fn next_dt(&mut self) -> f64 {
        let dt = match self.pattern {
            FramePattern::Steady { fps } => 1.0 / fps,
            FramePattern::Jittery { fps, jitter } => {
                let j = jitter.abs().min(0.99);
                (1.0 + self.rng.gen_range(-j..=j)) / fps
            }
            FramePattern::Bursty { short_secs, long_secs } => {
                if self.frame % 2 == 0 {
                    short_secs
                } else {
                    long_secs
                }
            }
        };
        self.frame += 1;
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
        }
        assert!("nope".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_jittery_frames_stay_in_range() {
        let pattern = FramePattern::Jittery { fps: 60.0, jitter: 0.8 };
        let mut timer = FrameTimer::new(pattern, 1);
        for _ in 0..1000 {
            let dt = timer.next_dt();
            assert!(dt > 0.0 && dt <= pattern.max_dt());
        }
    }

    #[test]
    fn test_bursty_alternates() {
        let mut timer = FrameTimer::new(
            FramePattern::Bursty {
                short_secs: 0.001,
                long_secs: 0.1,
            },
            0,
        );
        assert_eq!(timer.next_dt(), 0.001);
        assert_eq!(timer.next_dt(), 0.1);
        assert_eq!(timer.next_dt(), 0.001);
    }
}
