use std::collections::HashSet;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

use cluster_cmd::exec::{LineSink, PipeEnds, PipeFactory, StdStream, TracingSink};

/// A line sink that:
/// - records every line it receives, tagged with its stream
/// - forwards each line to `TracingSink` so failing tests still show output.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(StdStream, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(StdStream, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines of one stream, in arrival order.
    pub fn lines(&self, stream: StdStream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, l)| l.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().unwrap().is_empty()
    }
}

impl LineSink for RecordingSink {
    fn line(&self, stream: StdStream, line: &str) {
        TracingSink.line(stream, line);
        self.lines.lock().unwrap().push((stream, line.to_string()));
    }
}

/// An `AsyncWrite` whose contents stay readable after the writer is handed
/// to `with_stdout`.
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A pipe factory that fails for the configured streams and hands out real
/// pipes for the rest.
#[derive(Debug, Clone)]
pub struct FailingPipes {
    failing: HashSet<StdStream>,
    requested: Arc<Mutex<Vec<StdStream>>>,
}

impl FailingPipes {
    pub fn new(failing: impl IntoIterator<Item = StdStream>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Streams a pipe was asked for, in order.
    pub fn requested(&self) -> Vec<StdStream> {
        self.requested.lock().unwrap().clone()
    }
}

impl PipeFactory for FailingPipes {
    fn pipe(&self, stream: StdStream) -> io::Result<PipeEnds> {
        self.requested.lock().unwrap().push(stream);
        if self.failing.contains(&stream) {
            return Err(io::Error::other(format!("injected {stream} pipe failure")));
        }
        Ok(PipeEnds::deferred())
    }
}
