// src/exec/drain.rs

//! Background readers for the child's output pipes.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug};

use super::backend::LineSink;
use super::command::StdStream;

/// Read `reader` to end-of-stream, forwarding each newline-delimited line to
/// `sink` without its line terminator. Invalid UTF-8 is replaced rather than
/// ending the drain, so the pipe never backs up.
///
/// Returns the number of lines forwarded.
pub async fn drain_lines<R>(reader: R, stream: StdStream, sink: &dyn LineSink) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = trim_newline(&buf);
                sink.line(stream, &String::from_utf8_lossy(line));
                count += 1;
            }
            Err(e) => {
                debug!(%stream, error = %e, "stopped draining output");
                break;
            }
        }
    }

    count
}

/// Spawn [`drain_lines`] on the runtime inside `span`.
pub fn spawn_drain<R>(
    reader: R,
    stream: StdStream,
    sink: Arc<dyn LineSink>,
    span: Span,
) -> JoinHandle<usize>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move { drain_lines(reader, stream, sink.as_ref()).await }.instrument(span))
}

/// Copy `reader` into `writer` until end-of-stream, then flush and shut the
/// writer down.
pub async fn copy_stream<R, W>(mut reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let n = tokio::io::copy(&mut reader, &mut writer).await?;
    writer.flush().await?;
    writer.shutdown().await?;
    Ok(n)
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(StdStream, String)>>);

    impl LineSink for Collect {
        fn line(&self, stream: StdStream, line: &str) {
            self.0.lock().unwrap().push((stream, line.to_string()));
        }
    }

    #[tokio::test]
    async fn forwards_each_line_in_order() {
        let sink = Collect::default();
        let n = drain_lines(&b"one\ntwo\r\nthree"[..], StdStream::Stdout, &sink).await;

        assert_eq!(n, 3);
        let lines = sink.0.into_inner().unwrap();
        assert_eq!(
            lines,
            vec![
                (StdStream::Stdout, "one".to_string()),
                (StdStream::Stdout, "two".to_string()),
                (StdStream::Stdout, "three".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_stop_draining() {
        let sink = Collect::default();
        let n = drain_lines(&b"a\xff\nb\n"[..], StdStream::Stderr, &sink).await;

        assert_eq!(n, 2);
        let lines = sink.0.into_inner().unwrap();
        assert_eq!(lines[0].1, "a\u{fffd}");
        assert_eq!(lines[1].1, "b");
    }

    #[tokio::test]
    async fn empty_lines_are_kept() {
        let sink = Collect::default();
        let n = drain_lines(&b"\n\nx\n"[..], StdStream::Stdout, &sink).await;
        assert_eq!(n, 3);
    }

    #[tokio::test]
    async fn copy_stream_copies_verbatim() {
        let mut out = Vec::new();
        let n = copy_stream(&b"raw\nbytes"[..], &mut out).await.unwrap();
        assert_eq!(n, 9);
        assert_eq!(out, b"raw\nbytes");
    }
}
