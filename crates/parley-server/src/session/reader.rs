//! Background line reader.
//!
//! Reads the peer's byte stream in its own task, decodes it into trimmed,
//! length-capped lines and hands them over one at a time. End of stream and
//! read errors both close the handoff channel; there is no sentinel line.

use parley_core::LineDecoder;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

const READ_CHUNK: usize = 4096;

/// Receiving end of a session's line reader.
///
/// Dropping it closes the channel and aborts the reader task, which drops
/// the read half of the connection. A reader blocked on the socket or on a
/// full handoff slot therefore never outlives its session.
pub struct LineReader {
    rx: mpsc::Receiver<String>,
    task: JoinHandle<()>,
}

impl LineReader {
    /// Spawn the reader task on `reader`.
    pub fn spawn<R>(reader: R, peer: SocketAddr) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        // Single-slot handoff: the reader stays at most one line ahead.
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(read_lines(reader, tx, peer));
        Self { rx, task }
    }

    /// Next line, or `None` once the stream has ended.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_lines<R>(mut reader: R, tx: mpsc::Sender<String>, peer: SocketAddr)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = LineDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(peer = %peer, error = %e, "read failed, treating as end of stream");
                break;
            }
        };

        for line in decoder.feed(&buf[..n]) {
            if tx.send(line).await.is_err() {
                // Session already gone.
                return;
            }
        }
    }

    if let Some(line) = decoder.finish() {
        let _ = tx.send(line).await;
    }
    debug!(peer = %peer, "line reader finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::MAX_MESSAGE_SIZE;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[tokio::test]
    async fn yields_lines_then_closes() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut lines = LineReader::spawn(server, peer());

        client.write_all(b" hello \r\n\n/echo hi\nlast").await.unwrap();
        drop(client);

        assert_eq!(lines.next_line().await.as_deref(), Some("hello"));
        assert_eq!(lines.next_line().await.as_deref(), Some(""));
        assert_eq!(lines.next_line().await.as_deref(), Some("/echo hi"));
        assert_eq!(lines.next_line().await.as_deref(), Some("last"));
        assert_eq!(lines.next_line().await, None);
    }

    #[tokio::test]
    async fn long_lines_are_truncated() {
        let (mut client, server) = tokio::io::duplex(256);
        let mut lines = LineReader::spawn(server, peer());

        tokio::spawn(async move {
            let mut input = vec![b'z'; MAX_MESSAGE_SIZE * 3];
            input.push(b'\n');
            client.write_all(&input).await.unwrap();
        });

        let line = lines.next_line().await.unwrap();
        assert_eq!(line.len(), MAX_MESSAGE_SIZE);
        assert_eq!(lines.next_line().await, None);
    }

    #[tokio::test]
    async fn dropping_reader_releases_stream() {
        let (mut client, server) = tokio::io::duplex(64);
        let lines = LineReader::spawn(server, peer());

        // Fill the handoff slot so the reader task is parked on a send.
        client.write_all(b"a\nb\nc\n").await.unwrap();
        tokio::task::yield_now().await;
        drop(lines);

        // Once the task is gone the server half is dropped and writes fail.
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if client.write_all(b"more\n").await.is_err() {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(closed.is_ok(), "reader task kept the stream open");
    }
}
