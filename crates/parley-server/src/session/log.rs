//! Per-peer session log.
//!
//! One append-only text file per peer IP address, `<ip>.log`, holding
//! `[<RFC 3339 timestamp>] <text>` lines. Sessions from the same address
//! share the file; every entry goes out in a single append-mode write so
//! concurrent sessions interleave whole lines.

use chrono::{DateTime, Local, SecondsFormat};
use parley_core::{ParleyError, ParleyResult};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Event text written when a session starts.
pub const CONNECTED: &str = "Connected";
/// Event text written when a session ends.
pub const DISCONNECTED: &str = "Disconnected";

/// Append-only log handle owned by a single session.
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    file: File,
}

impl SessionLog {
    /// Log file path for a peer address inside `dir`.
    pub fn path_for(dir: &Path, ip: IpAddr) -> PathBuf {
        dir.join(format!("{ip}.log"))
    }

    /// Open (creating if absent) the log for `ip` in append mode.
    pub async fn open(dir: &Path, ip: IpAddr) -> ParleyResult<Self> {
        let path = Self::path_for(dir, ip);
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o644);

        let file = options
            .open(&path)
            .await
            .map_err(|source| ParleyError::LogOpen {
                path: path.clone(),
                source,
            })?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn connected(&mut self) {
        self.append(CONNECTED).await;
    }

    pub async fn disconnected(&mut self) {
        self.append(DISCONNECTED).await;
    }

    /// Record an inbound line verbatim.
    pub async fn message(&mut self, line: &str) {
        self.append(line).await;
    }

    /// Errors are logged but do not propagate; a broken log never ends a session.
    async fn append(&mut self, text: &str) {
        let entry = format_entry(Local::now(), text);
        if let Err(e) = self.write_entry(&entry).await {
            warn!(path = %self.path.display(), error = %e, "failed to append session log");
        }
    }

    async fn write_entry(&mut self, entry: &str) -> std::io::Result<()> {
        self.file.write_all(entry.as_bytes()).await?;
        self.file.flush().await
    }
}

/// Format one log line, newline included.
pub fn format_entry(at: DateTime<Local>, text: &str) -> String {
    format!(
        "[{}] {}\n",
        at.to_rfc3339_opts(SecondsFormat::Secs, false),
        text
    )
}
