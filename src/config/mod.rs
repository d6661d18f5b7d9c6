// src/config/mod.rs

//! Configuration loading and validation for smokerun.
//!
//! - `model.rs`: the TOML-backed data model and the validated
//!   [`SupervisorConfig`].
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: durations, sentinel regex, required fields.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{RawConfigFile, RunnerSection, SupervisorConfig, SupervisorSection};
pub use validate::parse_duration;
