//! Server configuration: TOML file + CLI overrides.

use crate::session::INACTIVITY_PERIOD;
use parley_core::{ParleyError, ParleyResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Seconds of silence before a session is dropped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_dir: default_log_dir(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

fn default_port() -> u16 {
    4000
}
fn default_log_dir() -> String {
    ".".to_string()
}
fn default_idle_timeout() -> u64 {
    INACTIVITY_PERIOD.as_secs()
}

/// Resolved server configuration (paths expanded, CLI overrides applied).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding the per-peer `<ip>.log` files.
    pub log_dir: PathBuf,
    pub idle_timeout: Duration,
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    pub fn load(
        config_path: Option<&Path>,
        cli_port: Option<u16>,
        cli_log_dir: Option<&str>,
        cli_idle_timeout: Option<u64>,
    ) -> ParleyResult<Self> {
        let file_config = match config_path {
            Some(path) => load_file(path)?,
            None => ConfigFile::default(),
        };

        let port = cli_port.unwrap_or(file_config.server.port);
        let log_dir = cli_log_dir
            .map(|s| s.to_string())
            .unwrap_or(file_config.server.log_dir);
        let idle_timeout = cli_idle_timeout.unwrap_or(file_config.server.idle_timeout);

        if idle_timeout == 0 {
            return Err(ParleyError::Config(
                "idle_timeout must be at least one second".into(),
            ));
        }

        Ok(Self {
            port,
            log_dir: expand_tilde_str(&log_dir),
            idle_timeout: Duration::from_secs(idle_timeout),
        })
    }

    /// Address the listener binds: all interfaces on the configured port.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn load_file(path: &Path) -> ParleyResult<ConfigFile> {
    let expanded = expand_tilde(path);
    if !expanded.exists() {
        info!(path = %expanded.display(), "config file not found, using defaults");
        return Ok(ConfigFile::default());
    }

    info!(path = %expanded.display(), "loading config file");
    let content = std::fs::read_to_string(&expanded)?;
    toml::from_str::<ConfigFile>(&content)
        .map_err(|e| ParleyError::Config(format!("{}: {e}", expanded.display())))
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    expand_tilde_str(&s)
}

fn expand_tilde_str(s: &str) -> PathBuf {
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(s)
}
