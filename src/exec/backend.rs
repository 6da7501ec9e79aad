// src/exec/backend.rs

//! Pluggable seams of the runner.
//!
//! - [`LineSink`] receives every line drained from an auto-piped stream.
//!   [`TracingSink`] is the production implementation and writes each line
//!   as a `debug` record.
//! - [`PipeFactory`] creates the pipe behind an auto-piped stream before the
//!   child is spawned. [`OsPipes`] asks the OS for one; tests plug in a
//!   factory that fails to check that nothing is started when pipe setup
//!   goes wrong.

use std::io;
use std::process::Stdio;

use tracing::debug;

use super::command::{BoxedReader, StdStream};

/// Destination for captured output lines.
///
/// Implementations must not block for long: they are called from the drain
/// task that keeps the child's pipe from filling up.
pub trait LineSink: Send + Sync {
    fn line(&self, stream: StdStream, line: &str);
}

/// Writes each line as a `tracing::debug!` record in the current span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn line(&self, stream: StdStream, line: &str) {
        debug!(%stream, "{}", line);
    }
}

/// Both ends of a pipe for one output stream.
///
/// `child_end` is handed to the child. `reader` is the parent's end; `None`
/// leaves pipe creation to `spawn`, and the runner reads from the child
/// handle instead.
pub struct PipeEnds {
    pub child_end: Stdio,
    pub reader: Option<BoxedReader>,
}

impl PipeEnds {
    /// Let `spawn` create the pipe.
    pub fn deferred() -> Self {
        Self {
            child_end: Stdio::piped(),
            reader: None,
        }
    }
}

/// Source of pipes for auto-piped output streams.
pub trait PipeFactory: Send + Sync {
    fn pipe(&self, stream: StdStream) -> io::Result<PipeEnds>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsPipes;

impl PipeFactory for OsPipes {
    /// Must be called from within a Tokio runtime: the read end is registered
    /// with the reactor.
    #[cfg(unix)]
    fn pipe(&self, _stream: StdStream) -> io::Result<PipeEnds> {
        let (tx, rx) = tokio::net::unix::pipe::pipe()?;
        // the child expects an ordinary blocking descriptor
        let write_fd = tx.into_blocking_fd()?;
        Ok(PipeEnds {
            child_end: Stdio::from(write_fd),
            reader: Some(Box::new(rx)),
        })
    }

    #[cfg(not(unix))]
    fn pipe(&self, _stream: StdStream) -> io::Result<PipeEnds> {
        Ok(PipeEnds::deferred())
    }
}
