// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmokerunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// `start` was called while a run is still active.
    #[error("AlreadyRunning: a smoke test run is already in progress")]
    AlreadyRunning,

    /// `stop` was called while no run is active.
    #[error("NotRunning: no smoke test run is currently in progress")]
    NotRunning,

    #[error("ExecutableNotFound: '{0}' was not found on PATH")]
    ExecutableNotFound(String),

    #[error("ProcessSpawnFailure: could not start '{program}': {reason}")]
    ProcessSpawn { program: String, reason: String },

    #[error("StreamReadFailure: reading {stream} failed: {source}")]
    StreamRead {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SmokerunError>;
