//! Headless replay demo - plays a canned run at an uneven frame rate
//!
//! Shows the engine producing the same ending whether frames arrive at a
//! steady 60 FPS or in bursts.
//!
//! Run: `cargo run --example headless_replay`

use nalgebra::Point2;
use replay_core::angle::normalize_delta;
use replay_core::{
    Outcome, PlaybackConfig, Pose, ReplayController, RouteDecision, Trajectory,
};

// ============================================================================
// ANSI COLOR CODES
// ============================================================================

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
}

use colors::*;

/// A quarter circle driven anticlockwise, heading crossing +π on the way.
fn arc_run(tick_rate: i64) -> (Trajectory, Outcome) {
    let n = 120;
    let samples = (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let theta = std::f64::consts::FRAC_PI_2 + t * std::f64::consts::PI;
            let heading = theta + std::f64::consts::FRAC_PI_2;
            // Report headings wrapped, as the simulator might
            Pose::new(10.0 * theta.cos(), 10.0 * theta.sin(), normalize_delta(heading), 1.0)
        })
        .collect();

    let trajectory = Trajectory::new(samples, tick_rate).expect("valid trajectory");
    (trajectory, Outcome::finished(n as i64))
}

fn play(label: &str, frame_times: impl Iterator<Item = f64>) {
    let (trajectory, outcome) = arc_run(60);
    let sink = |d: &RouteDecision| {
        println!("    {GREEN}→ scene transition: {}{RESET}", d.label());
    };

    let mut ctrl = ReplayController::new(PlaybackConfig::default(), sink);
    ctrl.load(trajectory, outcome, Point2::new(-7.4, 0.3))
        .expect("load");

    println!("{BOLD}{CYAN}{label}{RESET}");
    let mut frames = 0;
    for dt in frame_times {
        let Some(frame) = ctrl.step(dt) else { break };
        frames += 1;
        if frames % 30 == 0 || frame.finished {
            println!(
                "  {DIM}frame {:>4}{RESET}  idx {:>3}  pos ({:>7.3}, {:>7.3})  heading {:>7.2}°",
                frames,
                frame.index,
                frame.position.x,
                frame.position.y,
                frame.heading.to_degrees()
            );
        }
    }
    println!(
        "  {} frames, {:.3}s of playback\n",
        frames,
        ctrl.state().elapsed_secs
    );
}

fn main() {
    play("Steady 60 FPS", std::iter::repeat(1.0 / 60.0));
    play(
        "Bursty (2ms / 90ms)",
        (0..).map(|i| if i % 2 == 0 { 0.002 } else { 0.090 }),
    );
}
