// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::parser::patterns::DEFAULT_FINISHED_SENTINEL;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// program = "npx"
/// args = ["playwright", "test", "--headed"]
/// working_dir = "C:/MBP_Playwright"
///
/// [runner.env]
/// CLIENT_NAME = "acme"
///
/// [supervisor]
/// poll_interval = "100ms"
/// drain_timeout = "2s"
/// stop_grace = "5s"
/// finished_sentinel = "(?i)all tests finished"
/// max_run_duration = "30m"
/// ```
///
/// Only `runner.program` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub runner: RunnerSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// `[runner]` section: what to execute.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Program name (looked up on `PATH`) or a path to it.
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Directory the runner is started in. Defaults to the current one.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Extra environment for the runner process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl RunnerSection {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

/// `[supervisor]` section: how the run is watched.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    /// How often the streaming loop checks whether the process has exited.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Upper bound for draining the pipes once the process has exited.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: String,

    /// How long the runner may ignore a termination request before it is
    /// killed.
    #[serde(default = "default_stop_grace")]
    pub stop_grace: String,

    /// Regex marking full completion of the suite.
    #[serde(default = "default_finished_sentinel")]
    pub finished_sentinel: String,

    /// Optional fail-safe; the runner is terminated when it elapses.
    #[serde(default)]
    pub max_run_duration: Option<String>,
}

fn default_poll_interval() -> String {
    "100ms".to_string()
}

fn default_drain_timeout() -> String {
    "2s".to_string()
}

fn default_stop_grace() -> String {
    "5s".to_string()
}

fn default_finished_sentinel() -> String {
    DEFAULT_FINISHED_SENTINEL.to_string()
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            drain_timeout: default_drain_timeout(),
            stop_grace: default_stop_grace(),
            finished_sentinel: default_finished_sentinel(),
            max_run_duration: None,
        }
    }
}

/// Validated configuration consumed by the supervisor.
///
/// Build it from a [`RawConfigFile`] with `TryFrom`, or via
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub runner: RunnerSection,
    pub poll_interval: Duration,
    pub drain_timeout: Duration,
    pub stop_grace: Duration,
    pub finished_sentinel: Regex,
    pub max_run_duration: Option<Duration>,
}

impl SupervisorConfig {
    pub(crate) fn new_unchecked(
        runner: RunnerSection,
        poll_interval: Duration,
        drain_timeout: Duration,
        stop_grace: Duration,
        finished_sentinel: Regex,
        max_run_duration: Option<Duration>,
    ) -> Self {
        Self {
            runner,
            poll_interval,
            drain_timeout,
            stop_grace,
            finished_sentinel,
            max_run_duration,
        }
    }

    /// Human-readable command line, for logs and diagnostics.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.runner.program.clone()];
        parts.extend(self.runner.args.iter().cloned());
        parts.join(" ")
    }
}
