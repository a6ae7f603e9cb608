//! The per-connection session loop.
//!
//! Races the next line from the [`LineReader`] against the
//! [`InactivityTimer`]. Each line resets the timer, is classified, logged,
//! and answered. The loop ends on timeout, on a session-ending command, or
//! when the stream closes. The socket, log file and reader task are
//! released on every one of those paths.

use super::log::SessionLog;
use super::reader::LineReader;
use super::timer::InactivityTimer;
use chrono::Utc;
use parley_core::{dispatch, INACTIVITY_NOTICE};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    TimedOut,
    Closed,
}

/// Why a session left the `Active` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Timeout,
    /// `bye` or `/quit`.
    Quit,
    /// The peer closed the stream or it failed.
    Eof,
    /// Writing a response failed.
    WriteFailed,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DisconnectReason::Timeout => "timeout",
            DisconnectReason::Quit => "quit",
            DisconnectReason::Eof => "eof",
            DisconnectReason::WriteFailed => "write failed",
        };
        f.write_str(s)
    }
}

/// One accepted connection. Owned and mutated only by its own loop.
pub struct Session<W> {
    peer: SocketAddr,
    writer: W,
    log: SessionLog,
    timer: InactivityTimer,
    state: SessionState,
    reason: Option<DisconnectReason>,
}

impl<W> Session<W>
where
    W: AsyncWrite + Unpin,
{
    /// Log `Connected` and arm the inactivity timer.
    pub async fn start(
        peer: SocketAddr,
        writer: W,
        mut log: SessionLog,
        inactivity_period: Duration,
    ) -> Self {
        log.connected().await;
        Self {
            peer,
            writer,
            log,
            timer: InactivityTimer::new(inactivity_period),
            state: SessionState::Active,
            reason: None,
        }
    }

    /// Drive the session to completion and return its terminal state.
    pub async fn run(mut self, mut lines: LineReader) -> SessionState {
        while self.state == SessionState::Active {
            tokio::select! {
                () = self.timer.expired() => self.on_timeout().await,
                line = lines.next_line() => match line {
                    Some(line) => self.on_line(&line).await,
                    None => self.finish(SessionState::Closed, DisconnectReason::Eof),
                },
            }
        }

        drop(lines);
        self.teardown().await
    }

    async fn on_line(&mut self, line: &str) {
        self.timer.reset();
        let reply = dispatch(line, Utc::now());
        self.log.message(line).await;

        if let Err(e) = self.send(&reply.to_wire()).await {
            debug!(peer = %self.peer, error = %e, "failed to write response");
            self.finish(SessionState::Closed, DisconnectReason::WriteFailed);
            return;
        }

        if reply.ends_session {
            self.finish(SessionState::Closed, DisconnectReason::Quit);
        }
    }

    async fn on_timeout(&mut self) {
        let notice = format!("{INACTIVITY_NOTICE}\n");
        if let Err(e) = self.send(notice.as_bytes()).await {
            debug!(peer = %self.peer, error = %e, "failed to write timeout notice");
        }
        self.finish(SessionState::TimedOut, DisconnectReason::Timeout);
    }

    fn finish(&mut self, state: SessionState, reason: DisconnectReason) {
        self.state = state;
        self.reason = Some(reason);
    }

    async fn send(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }

    async fn teardown(mut self) -> SessionState {
        self.log.disconnected().await;
        let _ = self.writer.shutdown().await;

        let reason = self.reason.unwrap_or(DisconnectReason::Eof);
        info!(peer = %self.peer, reason = %reason, "peer disconnected");
        self.state
    }
}
