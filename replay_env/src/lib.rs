//! Replay Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" seam that lets the replay engine run
//! against both a **Production** host (tokio, real HTTP collaborator) and a
//! **Simulation** harness (virtual clock, synthetic runs).
//!
//! # Core Concept: Suspend, Don't Spin
//!
//! Everything that can wait is expressed as an `async fn`:
//! - Time (`now()`, `sleep()`)
//! - Run submission and leaderboard fetches (`submit()`, `leaderboard()`)
//!
//! A caller awaiting a run is resumed by the runtime when the payload is
//! available. Nothing in the engine polls a "request done" flag.
//!
//! # Example
//!
//! ```ignore
//! use replay_env::{EnvError, HttpRunSource, RunRequest, RunSource};
//!
//! async fn fetch() -> Result<String, EnvError> {
//!     let src = HttpRunSource::new("http://localhost:8000")?;
//!     src.submit(RunRequest::new("alice", "fn drive(env) { .. }")).await
//! }
//! ```

mod context;
mod source;
mod types;
mod error;
mod tokio_impl;
mod http;

pub use context::ReplayContext;
pub use source::RunSource;
pub use types::{RunId, RunRequest};
pub use error::EnvError;
pub use tokio_impl::TokioContext;
pub use http::HttpRunSource;
