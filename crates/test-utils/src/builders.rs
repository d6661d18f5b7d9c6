#![allow(dead_code)]

use smokerun::config::{RawConfigFile, RunnerSection, SupervisorConfig, SupervisorSection};

/// Builder for `SupervisorConfig` to simplify test setup.
///
/// Defaults are tuned for tests: a 10ms poll interval and short drain and
/// stop grace periods.
pub struct SupervisorConfigBuilder {
    config: RawConfigFile,
}

impl SupervisorConfigBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            config: RawConfigFile {
                runner: RunnerSection::new(program),
                supervisor: SupervisorSection {
                    poll_interval: "10ms".to_string(),
                    drain_timeout: "500ms".to_string(),
                    stop_grace: "500ms".to_string(),
                    ..SupervisorSection::default()
                },
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.runner.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .runner
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.runner.working_dir = Some(dir.into());
        self
    }

    pub fn poll_interval(mut self, value: &str) -> Self {
        self.config.supervisor.poll_interval = value.to_string();
        self
    }

    pub fn drain_timeout(mut self, value: &str) -> Self {
        self.config.supervisor.drain_timeout = value.to_string();
        self
    }

    pub fn stop_grace(mut self, value: &str) -> Self {
        self.config.supervisor.stop_grace = value.to_string();
        self
    }

    pub fn finished_sentinel(mut self, pattern: &str) -> Self {
        self.config.supervisor.finished_sentinel = pattern.to_string();
        self
    }

    pub fn max_run_duration(mut self, value: &str) -> Self {
        self.config.supervisor.max_run_duration = Some(value.to_string());
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> SupervisorConfig {
        SupervisorConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
