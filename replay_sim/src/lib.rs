//! Replay Deterministic Simulation Harness
//!
//! Runs the replay engine against synthetic runs and adversarial frame
//! timing, with every source of non-determinism pinned to a seed:
//! - **Runs**: the [`Oracle`] drives a kinematic car and emits the same
//!   payload the remote simulator does
//! - **Time**: [`SimContext`] is a virtual clock that moves only on `sleep`
//! - **Frames**: [`FrameTimer`] produces steady, jittered or bursty deltas
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   ScenarioRunner                     │
//! │                                                      │
//! │  ┌────────┐ payload ┌──────────────┐  dt  ┌────────┐ │
//! │  │ Oracle │────────►│ SimRunSource │      │ Frame  │ │
//! │  └────────┘         └──────┬───────┘      │ Timer  │ │
//! │                            │ json         └───┬────┘ │
//! │                     ┌──────▼────────────┐     │      │
//! │                     │ ReplayController  │◄────┘      │
//! │                     └──────┬────────────┘            │
//! │                            │ frames, route           │
//! │                     ┌──────▼──────┐                  │
//! │                     │   checks    │                  │
//! │                     └─────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use replay_sim::{ScenarioRunner, ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::Bursty);
//! assert!(result.passed);
//! ```

mod context;
mod oracle;
mod source;
mod runner;
mod exporter;
pub mod scenarios;

pub use context::SimContext;
pub use oracle::{wrap_heading, Oracle, OracleConfig};
pub use source::SimRunSource;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use exporter::{ExportFrame, ExportPoint, ReplayExport};
pub use scenarios::{FramePattern, FrameTimer, ScenarioId};
