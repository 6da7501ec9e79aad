// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated `RawConfigFile`.
///
/// Use [`load_and_validate`] unless you need to inspect invalid configs.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Rejects empty program names and malformed `env` entries.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::errors::CmdError;
    use crate::logging::LogLevel;

    #[test]
    fn empty_file_yields_defaults() {
        let raw = load_from_str("").unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.runner.program, "kubectl");
        assert_eq!(cfg.runner.display_name, None);
        assert!(cfg.runner.env.is_empty());
    }

    #[test]
    fn full_runner_section_parses() {
        let raw = load_from_str(
            r#"
[runner]
program = "/opt/bin/kubectl"
display_name = "kubectl"
env = ["KUBECONFIG=/tmp/kc", "A=b=c"]
working_dir = "/tmp"
log_level = "debug"
"#,
        )
        .unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();

        assert_eq!(cfg.runner.program, "/opt/bin/kubectl");
        assert_eq!(cfg.runner.display_name.as_deref(), Some("kubectl"));
        assert_eq!(cfg.runner.env, vec!["KUBECONFIG=/tmp/kc", "A=b=c"]);
        assert_eq!(cfg.runner.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(cfg.runner.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn unknown_runner_key_is_a_toml_error() {
        let err = load_from_str("[runner]\ntimeout = 5\n").unwrap_err();
        assert!(matches!(err, CmdError::TomlError(_)));
    }

    #[test]
    fn malformed_env_entry_is_rejected() {
        let raw = load_from_str("[runner]\nenv = [\"NOVALUE\"]\n").unwrap();
        match ConfigFile::try_from(raw) {
            Err(CmdError::ConfigError(msg)) => assert!(msg.contains("NOVALUE")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn empty_program_is_rejected() {
        let raw = load_from_str("[runner]\nprogram = \"  \"\n").unwrap();
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(CmdError::ConfigError(_))
        ));
    }
}
