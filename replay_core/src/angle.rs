//! The Angle Unwrapper - absolute headings to shortest-arc deltas.
//!
//! All angles are radians. A normalized delta lies in `(-π, π]`, so a heading
//! crossing the ±π seam rotates the short way round.

use std::f64::consts::{PI, TAU};

/// Normalizes a raw heading difference into `(-π, π]`.
pub fn normalize_delta(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }

    // rem_euclid lands in [0, 2π); shift so the half-open end sits at +π
    let wrapped = (raw + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Converts absolute headings into per-sample deltas.
///
/// The output is index-aligned with the input. Element 0 has no predecessor
/// and is `0.0`.
pub fn unwrap_deltas(headings: &[f64]) -> Vec<f64> {
    let mut deltas = Vec::with_capacity(headings.len());
    if headings.is_empty() {
        return deltas;
    }

    deltas.push(0.0);
    deltas.extend(headings.windows(2).map(|w| normalize_delta(w[1] - w[0])));
    deltas
}

/// Prefix sums of `deltas`: a continuous heading profile relative to the
/// first sample, free of ±π jumps.
pub fn accumulate(deltas: &[f64]) -> Vec<f64> {
    deltas
        .iter()
        .scan(0.0, |acc, d| {
            *acc += d;
            Some(*acc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn deg(d: f64) -> f64 {
        d.to_radians()
    }

    #[test]
    fn test_short_way_backwards() {
        let deltas = unwrap_deltas(&[deg(10.0), deg(350.0)]);
        assert_eq!(deltas.len(), 2);
        assert_relative_eq!(deltas[0], 0.0);
        assert_relative_eq!(deltas[1], deg(-20.0), epsilon = 1e-9);
    }

    #[test]
    fn test_short_way_across_seam() {
        let deltas = unwrap_deltas(&[deg(170.0), deg(-170.0)]);
        assert_relative_eq!(deltas[1], deg(20.0), epsilon = 1e-9);

        let deltas = unwrap_deltas(&[deg(179.0), deg(-179.0)]);
        assert_relative_eq!(deltas[1], deg(2.0), epsilon = 1e-9);
    }

    #[test]
    fn test_half_turn_is_positive() {
        // Exactly ±π resolves to +π
        assert_relative_eq!(normalize_delta(PI), PI, epsilon = 1e-12);
        assert_relative_eq!(normalize_delta(-PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_multi_turn_raw_delta() {
        assert_relative_eq!(normalize_delta(deg(725.0)), deg(5.0), epsilon = 1e-9);
        assert_relative_eq!(normalize_delta(deg(-725.0)), deg(-5.0), epsilon = 1e-9);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(unwrap_deltas(&[]).is_empty());
        assert_eq!(unwrap_deltas(&[1.0]), vec![0.0]);
    }

    #[test]
    fn test_accumulate_is_continuous() {
        // Heading spins anticlockwise through the seam twice
        let headings: Vec<f64> = (0..40)
            .map(|i| normalize_delta(deg(i as f64 * 20.0)))
            .collect();
        let profile = accumulate(&unwrap_deltas(&headings));

        assert_relative_eq!(profile[39], deg(780.0), epsilon = 1e-9);
        for w in profile.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    proptest! {
        #[test]
        fn prop_delta_in_half_open_range(raw in -100.0f64..100.0) {
            let d = normalize_delta(raw);
            prop_assert!(d > -PI && d <= PI + 1e-12);
        }

        #[test]
        fn prop_delta_is_congruent(a in -10.0f64..10.0, b in -10.0f64..10.0) {
            let d = unwrap_deltas(&[a, b])[1];
            let turns = (b - a - d) / TAU;
            prop_assert!((turns - turns.round()).abs() < 1e-9);
        }
    }
}
