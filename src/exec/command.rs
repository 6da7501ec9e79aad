// src/exec/command.rs

//! Process descriptor and the composable options that configure it.
//!
//! A [`CommandSpec`] is built fresh for every invocation. Each [`CmdOption`]
//! mutates the fields it owns; options are applied in the order given, so a
//! later option touching the same field replaces what an earlier one set.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use super::env::Environment;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One of the child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StdStream::Stdin => "stdin",
            StdStream::Stdout => "stdout",
            StdStream::Stderr => "stderr",
        })
    }
}

/// A not-yet-started external command.
///
/// - `env = None` means the child inherits the parent environment.
/// - `stdout`/`stderr = None` means the runner pipes the stream and drains it
///   to its line sink; `Some(writer)` means the output is copied to `writer`.
/// - `stdin = None` connects the child to the null device.
pub struct CommandSpec {
    pub executable: String,
    pub display_name: String,
    pub args: Vec<String>,
    pub env: Option<Environment>,
    pub working_dir: Option<PathBuf>,
    pub stdin: Option<BoxedReader>,
    pub stdout: Option<BoxedWriter>,
    pub stderr: Option<BoxedWriter>,
    base_env: Arc<Environment>,
}

impl CommandSpec {
    pub fn new(
        executable: impl Into<String>,
        display_name: impl Into<String>,
        base_env: Arc<Environment>,
    ) -> Self {
        let executable = executable.into();
        Self {
            args: vec![executable.clone()],
            executable,
            display_name: display_name.into(),
            env: None,
            working_dir: None,
            stdin: None,
            stdout: None,
            stderr: None,
            base_env,
        }
    }

    /// The snapshot `with_env` extends.
    pub fn base_env(&self) -> &Environment {
        &self.base_env
    }

    /// Apply options in order.
    pub fn apply<I>(&mut self, options: I)
    where
        I: IntoIterator<Item = CmdOption>,
    {
        for option in options {
            option.apply(self);
        }
    }

    /// Arguments passed after argv[0].
    pub fn trailing_args(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("executable", &self.executable)
            .field("args", &self.args)
            .field("env", &self.env.as_ref().map(Environment::len))
            .field("working_dir", &self.working_dir)
            .field("stdin_bound", &self.stdin.is_some())
            .field("stdout_bound", &self.stdout.is_some())
            .field("stderr_bound", &self.stderr.is_some())
            .finish()
    }
}

/// A single unit of configuration for a [`CommandSpec`].
pub struct CmdOption(Box<dyn FnOnce(&mut CommandSpec) + Send>);

impl CmdOption {
    /// Wrap an arbitrary mutation. Useful for settings with no dedicated
    /// builder, such as binding stderr.
    pub fn new(f: impl FnOnce(&mut CommandSpec) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn apply(self, spec: &mut CommandSpec) {
        (self.0)(spec)
    }
}

impl fmt::Debug for CmdOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CmdOption")
    }
}

/// Replace the argument vector with `[display_name, args...]`.
pub fn with_args<I, S>(args: I) -> CmdOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    CmdOption::new(move |spec| {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(spec.display_name.clone());
        full.extend(args);
        spec.args = full;
    })
}

/// Give the child the base environment extended with `KEY=VALUE` entries.
pub fn with_env<I, S>(vars: I) -> CmdOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let vars: Vec<String> = vars.into_iter().map(Into::into).collect();
    CmdOption::new(move |spec| {
        spec.env = Some(spec.base_env.merged(&vars));
    })
}

/// Feed `reader` into the child's stdin.
pub fn with_stdin<R>(reader: R) -> CmdOption
where
    R: AsyncRead + Send + Unpin + 'static,
{
    CmdOption::new(move |spec| {
        spec.stdin = Some(Box::new(reader));
    })
}

/// Copy the child's stdout into `writer` instead of logging it.
pub fn with_stdout<W>(writer: W) -> CmdOption
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    CmdOption::new(move |spec| {
        spec.stdout = Some(Box::new(writer));
    })
}

pub fn with_working_dir(dir: impl Into<PathBuf>) -> CmdOption {
    let dir = dir.into();
    CmdOption::new(move |spec| {
        spec.working_dir = Some(dir);
    })
}
