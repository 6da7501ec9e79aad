// src/exec/runner.rs

//! Single-shot command runner.

use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, debug_span, warn};

use crate::config::RunnerConfig;
use crate::errors::{CmdError, Result};

use super::backend::{LineSink, OsPipes, PipeEnds, PipeFactory, TracingSink};
use super::command::{BoxedReader, CmdOption, CommandSpec, StdStream};
use super::drain::{copy_stream, spawn_drain};
use super::env::Environment;

pub const DEFAULT_PROGRAM: &str = "kubectl";

/// How long output pipes may stay open after the child exited, e.g. because
/// a backgrounded grandchild inherited them.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Builds and runs external commands, draining any output the caller did not
/// redirect into a [`LineSink`].
///
/// A `Runner` holds no per-invocation state, so one instance can serve any
/// number of concurrent `run` calls.
#[derive(Clone)]
pub struct Runner {
    program: String,
    display_name: String,
    environment: Arc<Environment>,
    env_overlay: bool,
    working_dir: Option<PathBuf>,
    drain_grace: Duration,
    sink: Arc<dyn LineSink>,
    pipes: Arc<dyn PipeFactory>,
}

impl Runner {
    /// Runner for `kubectl` over a snapshot of the ambient environment.
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            display_name: DEFAULT_PROGRAM.to_string(),
            environment: Arc::new(Environment::ambient()),
            env_overlay: false,
            working_dir: None,
            drain_grace: DEFAULT_DRAIN_GRACE,
            sink: Arc::new(TracingSink),
            pipes: Arc::new(OsPipes),
        }
    }

    /// Build a runner from the `[runner]` config section.
    ///
    /// Configured `env` entries are layered over the ambient snapshot and
    /// passed to every child, even when the caller adds no `with_env`.
    pub fn from_config(cfg: &RunnerConfig) -> Self {
        let display_name = cfg
            .display_name
            .clone()
            .unwrap_or_else(|| cfg.program.clone());
        let environment = Environment::ambient().merged(&cfg.env);

        Self {
            program: cfg.program.clone(),
            display_name,
            environment: Arc::new(environment),
            env_overlay: !cfg.env.is_empty(),
            working_dir: cfg.working_dir.clone(),
            drain_grace: DEFAULT_DRAIN_GRACE,
            sink: Arc::new(TracingSink),
            pipes: Arc::new(OsPipes),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Name written to argv[0] by `with_args`.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Replace the environment snapshot `with_env` extends.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.environment = Arc::new(env);
        self
    }

    /// Bound the wait for output pipes to close after the child exited.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_pipes(mut self, pipes: Arc<dyn PipeFactory>) -> Self {
        self.pipes = pipes;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Fresh descriptor for `name` with this runner's defaults applied.
    pub fn command_spec(&self, name: &str) -> CommandSpec {
        let mut spec = CommandSpec::new(name, &self.display_name, Arc::clone(&self.environment));
        if self.env_overlay {
            spec.env = Some(self.environment.as_ref().clone());
        }
        spec.working_dir = self.working_dir.clone();
        spec
    }

    /// Run the configured program.
    pub async fn run_default<I>(&self, cancel: &CancellationToken, options: I) -> Result<()>
    where
        I: IntoIterator<Item = CmdOption>,
    {
        self.run(cancel, &self.program, options).await
    }

    /// Run `name` with `options` applied in order and wait for it to exit.
    ///
    /// - Unbound stdout/stderr are piped and every line is handed to the sink.
    ///   Lines written before the child exited have been delivered by the
    ///   time this returns. Pipes still held open by a grandchild are closed
    ///   once the drain grace period runs out.
    /// - Cancelling `cancel` kills the child and returns
    ///   [`CmdError::Cancelled`].
    /// - A non-zero exit is reported as [`CmdError::ExitStatus`].
    pub async fn run<I>(&self, cancel: &CancellationToken, name: &str, options: I) -> Result<()>
    where
        I: IntoIterator<Item = CmdOption>,
    {
        let options: Vec<CmdOption> = options.into_iter().collect();
        let span = debug_span!("cmd", name = %name);
        self.run_inner(cancel, name, options).instrument(span).await
    }

    async fn run_inner(
        &self,
        cancel: &CancellationToken,
        name: &str,
        options: Vec<CmdOption>,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(CmdError::Cancelled {
                name: name.to_string(),
            });
        }

        let mut spec = self.command_spec(name);
        spec.apply(options);

        let mut command = Command::new(&spec.executable);
        command.args(spec.trailing_args()).kill_on_drop(true);
        #[cfg(unix)]
        {
            if let Some(arg0) = spec.args.first() {
                command.arg0(arg0);
            }
        }
        if let Some(env) = &spec.env {
            command.env_clear().envs(env.iter());
        }
        if let Some(dir) = spec.working_dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            command.current_dir(dir);
        }

        let stdin_reader = spec.stdin.take();
        let stderr_writer = spec.stderr.take();
        let stdout_writer = spec.stdout.take();

        command.stdin(if stdin_reader.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        let stderr_pipe = self.output_pipe(name, StdStream::Stderr, stderr_writer.is_some())?;
        let stdout_pipe = self.output_pipe(name, StdStream::Stdout, stdout_writer.is_some())?;
        command.stderr(stderr_pipe.child_end);
        command.stdout(stdout_pipe.child_end);

        debug!(args = ?spec.args, "running {}", name);

        let mut child = command.spawn().map_err(|source| CmdError::Spawn {
            name: name.to_string(),
            source,
        })?;
        // closes the parent's copies of the child ends so drains see EOF
        drop(command);

        let mut tasks = StreamTasks::default();
        let span = Span::current();

        let stderr = stderr_pipe
            .reader
            .or_else(|| child.stderr.take().map(|r| Box::new(r) as BoxedReader));
        if let Some(stderr) = stderr {
            match stderr_writer {
                Some(w) => tasks.copy(StdStream::Stderr, tokio::spawn(copy_stream(stderr, w))),
                None => tasks.drain(spawn_drain(
                    stderr,
                    StdStream::Stderr,
                    Arc::clone(&self.sink),
                    span.clone(),
                )),
            }
        }
        let stdout = stdout_pipe
            .reader
            .or_else(|| child.stdout.take().map(|r| Box::new(r) as BoxedReader));
        if let Some(stdout) = stdout {
            match stdout_writer {
                Some(w) => tasks.copy(StdStream::Stdout, tokio::spawn(copy_stream(stdout, w))),
                None => tasks.drain(spawn_drain(
                    stdout,
                    StdStream::Stdout,
                    Arc::clone(&self.sink),
                    span,
                )),
            }
        }
        if let (Some(reader), Some(pipe)) = (stdin_reader, child.stdin.take()) {
            tasks.feeder = Some(tokio::spawn(copy_stream(reader, pipe)));
        }

        let status = tokio::select! {
            res = child.wait() => res.map_err(|source| CmdError::Wait {
                name: name.to_string(),
                source,
            })?,
            () = cancel.cancelled() => {
                debug!("cancellation requested; killing process");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill cancelled process");
                }
                tasks.abort();
                return Err(CmdError::Cancelled { name: name.to_string() });
            }
        };

        debug!(
            exit_code = ?status.code(),
            success = status.success(),
            "{} exited",
            name
        );

        let copy_err = tasks.join(self.drain_grace).await;
        finish(name, status, copy_err)
    }

    /// Pipe for an output stream. Bound streams get a plain `spawn` pipe the
    /// copier reads from; unbound ones come from the pipe factory.
    fn output_pipe(&self, name: &str, stream: StdStream, bound: bool) -> Result<PipeEnds> {
        if bound {
            return Ok(PipeEnds::deferred());
        }
        self.pipes.pipe(stream).map_err(|source| CmdError::Pipe {
            name: name.to_string(),
            stream,
            source,
        })
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `name` through a default [`Runner`].
pub async fn run<I>(cancel: &CancellationToken, name: &str, options: I) -> Result<()>
where
    I: IntoIterator<Item = CmdOption>,
{
    Runner::new().run(cancel, name, options).await
}

/// Background tasks attached to one child's standard streams.
#[derive(Default)]
struct StreamTasks {
    drains: Vec<JoinHandle<usize>>,
    copies: Vec<(StdStream, JoinHandle<io::Result<u64>>)>,
    feeder: Option<JoinHandle<io::Result<u64>>>,
}

impl StreamTasks {
    fn drain(&mut self, handle: JoinHandle<usize>) {
        self.drains.push(handle);
    }

    fn copy(&mut self, stream: StdStream, handle: JoinHandle<io::Result<u64>>) {
        self.copies.push((stream, handle));
    }

    /// Drop every task. Aborting a drain closes the read end of its pipe.
    fn abort(self) {
        for handle in &self.drains {
            handle.abort();
        }
        for (_, handle) in &self.copies {
            handle.abort();
        }
        if let Some(feeder) = &self.feeder {
            feeder.abort();
        }
    }

    /// Wait for drains and output copies to reach end-of-stream after the
    /// child exited. Returns the first copy error, if any.
    ///
    /// A grandchild that inherited a pipe can keep it open long after the
    /// child is gone; whatever is still running after `grace` is aborted.
    /// The stdin feeder is only inspected: once the child is gone there is
    /// nobody left to read what it would still write.
    async fn join(mut self, grace: Duration) -> Option<(StdStream, io::Error)> {
        let mut first_err = None;

        let outputs = async {
            for handle in &mut self.drains {
                match handle.await {
                    Ok(lines) => debug!(lines, "output drained"),
                    Err(e) => debug!(error = %e, "drain task ended abnormally"),
                }
            }

            for (stream, handle) in &mut self.copies {
                let res = match handle.await {
                    Ok(res) => res,
                    Err(e) => Err(io::Error::other(e)),
                };
                if let Err(e) = res {
                    if first_err.is_none() {
                        first_err = Some((*stream, e));
                    }
                }
            }
        };

        if timeout(grace, outputs).await.is_err() {
            debug!(?grace, "output still open after exit; closing pipes");
            for handle in &self.drains {
                handle.abort();
            }
            for (_, handle) in &self.copies {
                handle.abort();
            }
        }

        if let Some(feeder) = self.feeder {
            if feeder.is_finished() {
                let res = match feeder.await {
                    Ok(res) => res,
                    Err(e) => Err(io::Error::other(e)),
                };
                match res {
                    Err(e) if e.kind() != io::ErrorKind::BrokenPipe && first_err.is_none() => {
                        first_err = Some((StdStream::Stdin, e));
                    }
                    _ => {}
                }
            } else {
                feeder.abort();
            }
        }

        first_err
    }
}

/// Exit status takes precedence over copy errors.
fn finish(name: &str, status: ExitStatus, copy_err: Option<(StdStream, io::Error)>) -> Result<()> {
    if !status.success() {
        return Err(CmdError::ExitStatus {
            name: name.to_string(),
            status,
        });
    }
    match copy_err {
        Some((stream, source)) => Err(CmdError::Copy {
            name: name.to_string(),
            stream,
            source,
        }),
        None => Ok(()),
    }
}
