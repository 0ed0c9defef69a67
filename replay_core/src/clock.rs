//! The Playback Clock - elapsed time to sample index.
//!
//! The clock is a pure function of elapsed seconds. It owns no timer;
//! pausing a replay simply means the caller stops advancing elapsed time.

/// Converts elapsed playback time into a target sample index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    tick_rate: u32,
    last_index: usize,
}

impl PlaybackClock {
    /// Creates a clock for `sample_count` samples at `tick_rate` Hz.
    ///
    /// `sample_count` of zero is treated as one; `Trajectory` never
    /// produces it.
    pub fn new(tick_rate: u32, sample_count: usize) -> Self {
        Self {
            tick_rate: tick_rate.max(1),
            last_index: sample_count.saturating_sub(1),
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn last_index(&self) -> usize {
        self.last_index
    }

    /// Elapsed time in ticks, clamped to `[0, last_index]`.
    fn ticks(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs.is_nan() || elapsed_secs <= 0.0 {
            return 0.0;
        }
        (elapsed_secs * self.tick_rate as f64).min(self.last_index as f64)
    }

    /// `floor(elapsed * tick_rate)` clamped to `[0, len - 1]`.
    pub fn target_index(&self, elapsed_secs: f64) -> usize {
        self.ticks(elapsed_secs).floor() as usize
    }

    /// Fraction of the current tick that has elapsed, in `[0, 1)`.
    ///
    /// Zero once the last sample is reached.
    pub fn tick_fraction(&self, elapsed_secs: f64) -> f64 {
        let ticks = self.ticks(elapsed_secs);
        ticks - ticks.floor()
    }

    /// Whether the target index has reached the final sample.
    pub fn is_complete(&self, elapsed_secs: f64) -> bool {
        self.target_index(elapsed_secs) >= self.last_index
    }

    /// Playback time at which the final sample is reached.
    pub fn completion_secs(&self) -> f64 {
        self.last_index as f64 / self.tick_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_floor_of_elapsed_ticks() {
        let clock = PlaybackClock::new(10, 50);
        assert_eq!(clock.target_index(0.0), 0);
        assert_eq!(clock.target_index(0.099), 0);
        assert_eq!(clock.target_index(0.1), 1);
        assert_eq!(clock.target_index(2.55), 25);
    }

    #[test]
    fn test_clamped_to_bounds() {
        let clock = PlaybackClock::new(10, 50);
        assert_eq!(clock.target_index(-3.0), 0);
        assert_eq!(clock.target_index(f64::NAN), 0);
        assert_eq!(clock.target_index(100.0), 49);
        assert_eq!(clock.target_index(f64::INFINITY), 49);
    }

    #[test]
    fn test_fraction_within_tick() {
        let clock = PlaybackClock::new(4, 10);
        assert_relative_eq!(clock.tick_fraction(0.375), 0.5, epsilon = 1e-12);
        assert_relative_eq!(clock.tick_fraction(50.0), 0.0);
    }

    #[test]
    fn test_completion_boundary() {
        let clock = PlaybackClock::new(10, 50);
        assert_relative_eq!(clock.completion_secs(), 4.9, epsilon = 1e-12);
        assert!(!clock.is_complete(4.89));
        assert!(clock.is_complete(4.9 + 1e-9));
    }

    #[test]
    fn test_single_sample_is_complete_immediately() {
        let clock = PlaybackClock::new(100, 1);
        assert!(clock.is_complete(0.0));
        assert_relative_eq!(clock.completion_secs(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_index_monotone_and_bounded(
            tick_rate in 1u32..500,
            len in 1usize..2000,
            mut times in proptest::collection::vec(0.0f64..100.0, 1..50),
        ) {
            let clock = PlaybackClock::new(tick_rate, len);
            times.sort_by(|a, b| a.partial_cmp(b).unwrap());

            let mut prev = 0;
            for t in times {
                let idx = clock.target_index(t);
                prop_assert!(idx >= prev);
                prop_assert!(idx <= len - 1);
                prev = idx;
            }
        }
    }
}
