// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RunnerConfig};
use crate::errors::{CmdError, Result};
use crate::exec::env::split_entry;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CmdError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.runner))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runner(&cfg.runner)
}

fn validate_runner(runner: &RunnerConfig) -> Result<()> {
    if runner.program.trim().is_empty() {
        return Err(CmdError::ConfigError(
            "[runner].program must not be empty".to_string(),
        ));
    }

    if let Some(name) = &runner.display_name {
        if name.trim().is_empty() {
            return Err(CmdError::ConfigError(
                "[runner].display_name must not be empty when set".to_string(),
            ));
        }
    }

    for entry in runner.env.iter() {
        if split_entry(entry).is_none() {
            return Err(CmdError::ConfigError(format!(
                "[runner].env entry '{}' is not of the form KEY=VALUE",
                entry
            )));
        }
    }

    Ok(())
}
