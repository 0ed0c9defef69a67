//! The Coordinate Mapper - simulation space to display space.
//!
//! Mapping is affine and anchored: the reference pose (conventionally the
//! first sample) lands exactly on the display origin, and every other pose is
//! placed relative to it with independent horizontal and vertical scales.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::trajectory::Pose;

/// Calibration between the simulator's units and the display canvas.
///
/// The horizontal factor is `display_width / sim_width` and the vertical
/// factor is `display_height / sim_height`. These are fixed per display
/// resolution, never derived at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayScale {
    pub sim_width: f64,
    pub display_width: f64,
    pub sim_height: f64,
    pub display_height: f64,
}

impl Default for DisplayScale {
    fn default() -> Self {
        // Calibrated against the default racetrack canvas
        Self {
            sim_width: 2.0,
            display_width: 0.125,
            sim_height: 10.0,
            display_height: 4.0,
        }
    }
}

impl DisplayScale {
    /// A scale that leaves distances untouched.
    pub fn identity() -> Self {
        Self {
            sim_width: 1.0,
            display_width: 1.0,
            sim_height: 1.0,
            display_height: 1.0,
        }
    }

    pub fn x_factor(&self) -> f64 {
        self.display_width / self.sim_width
    }

    pub fn y_factor(&self) -> f64 {
        self.display_height / self.sim_height
    }
}

/// Stateless simulation-to-display transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinateMapper {
    scale: DisplayScale,
}

impl CoordinateMapper {
    pub fn new(scale: DisplayScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> &DisplayScale {
        &self.scale
    }

    /// Maps `pose` into display space.
    ///
    /// # Arguments
    /// * `pose` - Pose to map
    /// * `reference` - Pose that defines the simulation-space origin
    /// * `origin` - Display position where playback begins
    pub fn map(&self, pose: &Pose, reference: &Pose, origin: Point2<f64>) -> Point2<f64> {
        let offset = pose.position - reference.position;
        let scaled = Vector2::new(offset.x * self.scale.x_factor(), offset.y * self.scale.y_factor());
        origin + scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_maps_to_origin() {
        let mapper = CoordinateMapper::default();
        let reference = Pose::new(13.0, -4.5, 1.0, 2.0);

        for origin in [Point2::new(0.0, 0.0), Point2::new(-7.4, 0.3), Point2::new(1e3, -1e3)] {
            let mapped = mapper.map(&reference, &reference, origin);
            assert_relative_eq!(mapped, origin);
        }
    }

    #[test]
    fn test_independent_axis_scales() {
        let mapper = CoordinateMapper::new(DisplayScale::default());
        let reference = Pose::new(0.0, 0.0, 0.0, 0.0);
        let pose = Pose::new(2.0, 10.0, 0.0, 0.0);

        let mapped = mapper.map(&pose, &reference, Point2::new(1.0, 1.0));

        // x: 2 * 0.125 / 2 = 0.125, y: 10 * 4 / 10 = 4
        assert_relative_eq!(mapped.x, 1.125, epsilon = 1e-12);
        assert_relative_eq!(mapped.y, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mapping_is_affine() {
        let mapper = CoordinateMapper::new(DisplayScale {
            sim_width: 4.0,
            display_width: 1.0,
            sim_height: 2.0,
            display_height: 3.0,
        });
        let reference = Pose::new(1.0, 1.0, 0.0, 0.0);
        let origin = Point2::new(10.0, 20.0);
        let a = Pose::new(3.0, 2.0, 0.0, 0.0);
        let b = Pose::new(5.0, 3.0, 0.0, 0.0);

        let da = mapper.map(&a, &reference, origin) - origin;
        let db = mapper.map(&b, &reference, origin) - origin;

        // b is twice as far from the reference as a
        assert_relative_eq!(db, da * 2.0, epsilon = 1e-12);
    }
}
