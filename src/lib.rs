// src/lib.rs

//! Run cluster CLI commands (`kubectl` by default) as child processes.
//!
//! ```no_run
//! use cluster_cmd::{CancellationToken, Runner, with_args, with_env};
//!
//! # async fn demo() -> cluster_cmd::errors::Result<()> {
//! let cancel = CancellationToken::new();
//! Runner::new()
//!     .run(
//!         &cancel,
//!         "kubectl",
//!         [with_args(["apply", "-f", "deploy.yaml"]), with_env(["KUBECONFIG=/tmp/kc"])],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Output the caller does not redirect is logged line by line at `debug`.

pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;

use std::path::Path;

use anyhow::Result;

pub use tokio_util::sync::CancellationToken;

pub use crate::errors::CmdError;
pub use crate::exec::{
    CmdOption, Environment, Runner, run, with_args, with_env, with_stdin, with_stdout,
    with_working_dir,
};

/// Load a config file, install logging at its level and build a [`Runner`].
///
/// Convenience for binaries; libraries should build a `Runner` directly and
/// leave subscriber setup to their host.
pub fn runner_from_config_file(path: impl AsRef<Path>) -> Result<Runner> {
    let cfg = config::load_and_validate(path)?;
    logging::init_logging(cfg.runner.log_level)?;
    Ok(Runner::from_config(&cfg.runner))
}
