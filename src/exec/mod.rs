// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs external commands with `tokio::process::Command` and
//! keeps their output flowing into the logs.
//!
//! - [`command`] holds the process descriptor and the `with_*` options.
//! - [`env`] provides the environment snapshot `with_env` builds on.
//! - [`runner`] owns the spawn / drain / wait / cancel lifecycle.
//! - [`drain`] contains the background line readers and stream copiers.
//! - [`backend`] provides the `LineSink` and `PipeFactory` traits with their
//!   production implementations, which tests replace with fakes.

pub mod backend;
pub mod command;
pub mod drain;
pub mod env;
pub mod runner;

pub use backend::{LineSink, OsPipes, PipeEnds, PipeFactory, TracingSink};
pub use command::{
    BoxedReader, BoxedWriter, CmdOption, CommandSpec, StdStream, with_args, with_env,
    with_stdin, with_stdout, with_working_dir,
};
pub use env::Environment;
pub use runner::{DEFAULT_DRAIN_GRACE, DEFAULT_PROGRAM, Runner, run};
