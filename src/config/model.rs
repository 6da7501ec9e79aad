// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::DEFAULT_PROGRAM;
use crate::logging::LogLevel;

/// Configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// program = "kubectl"
/// display_name = "kubectl"
/// env = ["KUBECONFIG=/tmp/kubeconfig"]
/// working_dir = "/tmp"
/// log_level = "debug"
/// ```
///
/// Every section and field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runner: RunnerConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(runner: RunnerConfig) -> Self {
        Self { runner }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Executable launched by `Runner::run_default`.
    #[serde(default = "default_program")]
    pub program: String,

    /// argv[0] written by `with_args`. Defaults to `program`.
    #[serde(default)]
    pub display_name: Option<String>,

    /// `KEY=VALUE` entries layered over the ambient environment for every
    /// command.
    #[serde(default)]
    pub env: Vec<String>,

    /// Working directory used unless an invocation sets its own.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            display_name: None,
            env: Vec::new(),
            working_dir: None,
            log_level: None,
        }
    }
}
