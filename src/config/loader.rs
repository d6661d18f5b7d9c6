// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawConfigFile, SupervisorConfig};
use crate::errors::Result;

/// Environment variable that overrides [`default_config_path`].
pub const CONFIG_ENV: &str = "SMOKERUN_CONFIG";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate
/// durations or the sentinel regex. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SupervisorConfig> {
    let raw_config = load_from_path(&path)?;
    let config = SupervisorConfig::try_from(raw_config)?;
    Ok(config)
}

/// `$SMOKERUN_CONFIG` if set, otherwise `Smokerun.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Smokerun.toml"))
}
