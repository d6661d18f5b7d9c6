// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually starting the test runner, using
//! `tokio::process::Command`, behind a trait the supervisor can swap out.
//!
//! - [`backend`] provides the `RunnerBackend` / `RunnerProcess` traits and
//!   the production `RealRunnerBackend`.
//! - [`locate`] resolves the runner program on `PATH`.

pub mod backend;
pub mod locate;

pub use backend::{
    ChildProcess, OutputStream, RealRunnerBackend, RunnerBackend, RunnerProcess, WaitFuture,
};
pub use locate::{locate_executable, locate_in};
