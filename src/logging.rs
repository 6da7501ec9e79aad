// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. the level passed by the caller (e.g. from the `[runner]` config)
//! 2. `CLUSTER_CMD_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Captured command output is logged at `debug`, so it only shows up once the
//! level is raised.

use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing_subscriber::fmt;

pub const LOG_ENV_VAR: &str = "CLUSTER_CMD_LOG";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
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
            other => Err(format!("invalid log level: {other}")),
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

/// Initialise the global logging subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn resolve_level(explicit: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    explicit
        .or_else(|| env_value.and_then(|s| s.parse().ok()))
        .map(tracing::Level::from)
        .unwrap_or(tracing::Level::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_beats_env() {
        let lvl = resolve_level(Some(LogLevel::Trace), Some("error"));
        assert_eq!(lvl, tracing::Level::TRACE);
    }

    #[test]
    fn env_value_is_parsed_leniently() {
        assert_eq!(resolve_level(None, Some(" Warning ")), tracing::Level::WARN);
        assert_eq!(resolve_level(None, Some("DEBUG")), tracing::Level::DEBUG);
    }

    #[test]
    fn unknown_env_value_falls_back_to_info() {
        assert_eq!(resolve_level(None, Some("loud")), tracing::Level::INFO);
        assert_eq!(resolve_level(None, None), tracing::Level::INFO);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
    }
}
