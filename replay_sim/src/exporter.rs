//! JSON exporter for replay traces.
//!
//! Writes every rendered frame alongside the display waypoints, so a
//! playback can be plotted or diffed between seeds offline.

use replay_core::{DisplayWaypoint, ReplayFrame, RouteDecision};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single rendered frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFrame {
    /// Playback time in seconds
    pub time_sec: f64,

    pub index: usize,
    pub x: f64,
    pub y: f64,

    /// Display heading in radians (unwrapped)
    pub heading: f64,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub finished: bool,
}

impl ExportFrame {
    pub fn new(time_sec: f64, frame: &ReplayFrame) -> Self {
        Self {
            time_sec,
            index: frame.index,
            x: frame.position.x,
            y: frame.position.y,
            heading: frame.heading,
            finished: frame.finished,
        }
    }
}

/// A display waypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPoint {
    pub x: f64,
    pub y: f64,
    pub heading_delta: f64,
}

impl From<&DisplayWaypoint> for ExportPoint {
    fn from(w: &DisplayWaypoint) -> Self {
        Self {
            x: w.position.x,
            y: w.position.y,
            heading_delta: w.heading_delta,
        }
    }
}

/// Complete replay export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    pub tick_rate: u32,

    /// Playback time at which the last sample is reached
    pub completion_sec: f64,

    pub waypoints: Vec<ExportPoint>,

    /// All frames
    pub frames: Vec<ExportFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDecision>,
}

impl ReplayExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            tick_rate: 0,
            completion_sec: 0.0,
            waypoints: Vec::new(),
            frames: Vec::new(),
            passed: false,
            route: None,
        }
    }

    /// Records the run being played.
    pub fn set_run(&mut self, tick_rate: u32, completion_sec: f64, waypoints: &[DisplayWaypoint]) {
        self.tick_rate = tick_rate;
        self.completion_sec = completion_sec;
        self.waypoints = waypoints.iter().map(ExportPoint::from).collect();
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, time_sec: f64, frame: &ReplayFrame) {
        self.frames.push(ExportFrame::new(time_sec, frame));
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, route: Option<RouteDecision>) {
        self.passed = passed;
        self.route = route;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use replay_core::Presentation;

    #[test]
    fn test_export_serializes_frames_and_route() {
        let mut export = ReplayExport::new("steady", 42);
        let frame = ReplayFrame {
            index: 3,
            position: Point2::new(1.5, -2.0),
            heading: 0.25,
            rotation_delta: 0.01,
            finished: true,
        };
        export.add_frame(0.5, &frame);
        export.finalize(
            true,
            Some(RouteDecision {
                presentation: Presentation::Finished,
                display_seconds: Some(0.5),
            }),
        );

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["frames"][0]["index"], 3);
        assert_eq!(json["frames"][0]["finished"], true);
        assert_eq!(json["route"]["presentation"], "finished");
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join("replay_export_test.json");
        let path = path.to_str().unwrap();

        ReplayExport::new("crash", 1).write_to_file(path).unwrap();
        let back: ReplayExport =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back.scenario, "crash");
        let _ = std::fs::remove_file(path);
    }
}
