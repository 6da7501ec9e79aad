// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::process::ExitStatus;

use thiserror::Error;

use crate::exec::StdStream;

#[derive(Error, Debug)]
pub enum CmdError {
    #[error("failed to create {stream} pipe for {name}: {source}")]
    Pipe {
        name: String,
        stream: StdStream,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for {name}: {source}")]
    Wait {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} failed: {status}")]
    ExitStatus { name: String, status: ExitStatus },

    #[error("{name} cancelled")]
    Cancelled { name: String },

    #[error("failed copying {stream} of {name}: {source}")]
    Copy {
        name: String,
        stream: StdStream,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl CmdError {
    /// Exit code of the child, if it ran to completion with a non-zero status.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CmdError::ExitStatus { status, .. } => status.code(),
            _ => None,
        }
    }

    /// True if the error came from the caller's cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CmdError::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, CmdError>;
