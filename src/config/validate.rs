// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::model::{RawConfigFile, SupervisorConfig};
use crate::errors::{Result, SmokerunError};

impl TryFrom<RawConfigFile> for SupervisorConfig {
    type Error = SmokerunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_program(&raw)?;

        let sup = &raw.supervisor;
        let poll_interval = config_duration("poll_interval", &sup.poll_interval)?;
        if poll_interval.is_zero() {
            return Err(SmokerunError::ConfigError(
                "[supervisor].poll_interval must be > 0".to_string(),
            ));
        }
        let drain_timeout = config_duration("drain_timeout", &sup.drain_timeout)?;
        let stop_grace = config_duration("stop_grace", &sup.stop_grace)?;
        let max_run_duration = sup
            .max_run_duration
            .as_deref()
            .map(|s| config_duration("max_run_duration", s))
            .transpose()?;
        let finished_sentinel = Regex::new(&sup.finished_sentinel).map_err(|e| {
            SmokerunError::ConfigError(format!(
                "[supervisor].finished_sentinel is not a valid regex: {e}"
            ))
        })?;

        Ok(SupervisorConfig::new_unchecked(
            raw.runner,
            poll_interval,
            drain_timeout,
            stop_grace,
            finished_sentinel,
            max_run_duration,
        ))
    }
}

fn ensure_has_program(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.program.trim().is_empty() {
        return Err(SmokerunError::ConfigError(
            "[runner].program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn config_duration(key: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| SmokerunError::ConfigError(format!("[supervisor].{key}: {e}")))
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
