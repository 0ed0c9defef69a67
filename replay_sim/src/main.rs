//! Replay DST Simulator CLI
//!
//! Replays synthetic runs under adversarial frame timing and checks that
//! every replay ends on time, on the last waypoint, with one transition.

use clap::Parser;
use replay_core::PlaybackConfig;
use replay_sim::{ScenarioId, ScenarioResult, ScenarioRunner};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Replay Deterministic Simulation Testing CLI
#[derive(Parser, Debug)]
#[command(name = "replay-sim")]
#[command(about = "Run deterministic replay scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (steady, jittery, bursty, slow_frames, heading_wrap, crash, single_sample, session, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of random seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Host frame rate
    #[arg(short, long, default_value = "60", value_parser = parse_fps)]
    fps: f64,

    /// Tick rate of generated runs
    #[arg(short, long, default_value = "100")]
    tick_rate: u32,

    /// Playback configuration JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the replayed frames to a JSON file
    #[arg(long)]
    export: Option<String>,
}

/// Accepts only finite, strictly positive frame rates.
fn parse_fps(s: &str) -> Result<f64, String> {
    let fps: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(format!("frame rate must be a positive number, got {}", s))
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging; RUST_LOG directives refine the base level
    let level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Replay DST Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = match &args.config {
        Some(path) => PlaybackConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => PlaybackConfig::default(),
    };

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios:");
            for s in ScenarioId::all() {
                eprintln!("  {:<14} {}", s.name(), s.description());
            }
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let runner_for = |seed: u64| {
        ScenarioRunner::new(seed)
            .with_fps(args.fps)
            .with_tick_rate(args.tick_rate)
            .with_config(config)
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        let (result, export) = runner_for(base_seed).run_with_export(scenarios[0]);
        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {:?}", e);
        } else {
            info!("Exported {} frames to {}", export.frames.len(), export_path);
        }

        if result.passed {
            info!("✓ {} (seed={}) PASSED", scenarios[0].name(), base_seed);
        } else {
            error!(
                "✗ {} FAILED: {}",
                scenarios[0].name(),
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
            std::process::exit(1);
        }
        return;
    }

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = runner_for(seed);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED - {} frames, {:.2}s, {}",
                        scenario.name(),
                        seed,
                        result.frames,
                        result.playback_secs,
                        result.route.map(|r| r.label()).unwrap_or_default()
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "frames": r.frames,
                    "samples": r.samples,
                    "playback_secs": r.playback_secs,
                    "completion_secs": r.completion_secs,
                    "route": r.route,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_must_be_positive() {
        assert_eq!(parse_fps("30"), Ok(30.0));
        assert!(parse_fps("0").is_err());
        assert!(parse_fps("-60").is_err());
        assert!(parse_fps("NaN").is_err());
        assert!(parse_fps("inf").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn test_cli_rejects_zero_fps() {
        assert!(Args::try_parse_from(["replay-sim", "--fps", "0"]).is_err());

        let args = Args::try_parse_from(["replay-sim", "--fps", "144"]).unwrap();
        assert_eq!(args.fps, 144.0);
    }
}
