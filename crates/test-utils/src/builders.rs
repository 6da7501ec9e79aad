#![allow(dead_code)]

use std::path::Path;

use cluster_cmd::config::{ConfigFile, RawConfigFile, RunnerConfig};
use cluster_cmd::logging::LogLevel;

/// Builder for `ConfigFile` to simplify test setup.
pub struct RunnerConfigBuilder {
    config: RawConfigFile,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                runner: RunnerConfig::default(),
            },
        }
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.runner.program = program.to_string();
        self
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.config.runner.display_name = Some(name.to_string());
        self
    }

    pub fn env(mut self, entry: &str) -> Self {
        self.config.runner.env.push(entry.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.runner.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.runner.log_level = Some(level);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build_runner_config(self) -> RunnerConfig {
        self.build().runner
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
