//! Display waypoints: mapped positions plus unwrapped heading deltas.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::angle::unwrap_deltas;
use crate::mapper::CoordinateMapper;
use crate::trajectory::Trajectory;

/// One sample, already in display space.
///
/// Index-aligned with `Trajectory::samples`. `heading_delta` is the shortest
/// rotation from the previous sample, `0.0` for the first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayWaypoint {
    pub position: Point2<f64>,
    pub heading_delta: f64,
}

/// Maps and unwraps every sample once, at load time.
///
/// The first sample is the reference pose, so waypoint 0 sits exactly on
/// `origin`.
pub fn build_waypoints(
    trajectory: &Trajectory,
    mapper: &CoordinateMapper,
    origin: Point2<f64>,
) -> Vec<DisplayWaypoint> {
    let reference = trajectory.first();
    let deltas = unwrap_deltas(&trajectory.headings());

    trajectory
        .samples()
        .iter()
        .zip(deltas)
        .map(|(pose, heading_delta)| DisplayWaypoint {
            position: mapper.map(pose, reference, origin),
            heading_delta,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::DisplayScale;
    use crate::trajectory::Pose;
    use approx::assert_relative_eq;

    #[test]
    fn test_waypoints_are_index_aligned() {
        let samples = vec![
            Pose::new(5.0, 5.0, 3.0, 0.0),
            Pose::new(6.0, 5.0, -3.0, 1.0),
            Pose::new(7.0, 6.0, -2.9, 1.0),
        ];
        let trajectory = Trajectory::new(samples, 10).unwrap();
        let mapper = CoordinateMapper::new(DisplayScale::identity());
        let origin = Point2::new(-7.4, 0.3);

        let wps = build_waypoints(&trajectory, &mapper, origin);

        assert_eq!(wps.len(), 3);
        assert_relative_eq!(wps[0].position, origin);
        assert_relative_eq!(wps[0].heading_delta, 0.0);
        assert_relative_eq!(wps[2].position, Point2::new(-5.4, 1.3), epsilon = 1e-12);

        // 3.0 -> -3.0 crosses the seam: 2π - 6 rather than -6
        assert_relative_eq!(wps[1].heading_delta, std::f64::consts::TAU - 6.0, epsilon = 1e-12);
        assert_relative_eq!(wps[2].heading_delta, 0.1, epsilon = 1e-12);
    }
}
