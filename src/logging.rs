// src/logging.rs

//! Logging setup for `smokerun` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. an explicit [`LogLevel`] passed by a host that embeds the supervisor
//!    (the bundled binary has no flags and passes `None`)
//! 2. `SMOKERUN_LOG` environment variable (e.g. "info", "debug"), parsed
//!    into a [`LogLevel`]
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout can be used purely for progress
//! output.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt;

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV: &str = "SMOKERUN_LOG";

/// Log level selectable by the host application.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Level selected by `SMOKERUN_LOG`, if it is set to a known level.
pub fn level_from_env() -> Option<LogLevel> {
    std::env::var(LOG_ENV).ok()?.parse().ok()
}

/// Initialise global logging subscriber.
///
/// Safe to call once at startup; a second call returns an error.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level: tracing::Level = level
        .or_else(level_from_env)
        .unwrap_or(LogLevel::Info)
        .into();

    // Send logs to stderr; keep stdout free for progress lines.
    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}
