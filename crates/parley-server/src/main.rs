//! parley-server: line-oriented TCP session server.
//!
//! Accepts plain-text connections, answers a handful of commands line by
//! line, drops silent peers, and appends per-peer activity to `<ip>.log`.

mod config;
mod server;
mod session;

use clap::Parser;
use config::ServerConfig;
use server::ParleyServer;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{error, info};

/// parley-server — line-oriented TCP session server
#[derive(Parser, Debug)]
#[command(name = "parley-server", version, about = "Line-oriented TCP session server")]
struct Cli {
    /// Listen port [default: 4000]; `-port` is also accepted
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path
    #[arg(long, default_value = "~/.parley/config.toml")]
    config: String,

    /// Directory for per-peer log files [default: .]
    #[arg(long)]
    log_dir: Option<String>,

    /// Inactivity timeout in seconds [default: 30]
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // Initialize tracing
    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config_path = PathBuf::from(&cli.config);
    let server_config = match ServerConfig::load(
        Some(&config_path),
        cli.port,
        cli.log_dir.as_deref(),
        cli.idle_timeout,
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = server_config.port,
        log_dir = %server_config.log_dir.display(),
        idle_timeout_secs = server_config.idle_timeout.as_secs(),
        "starting parley-server"
    );

    let server = match ParleyServer::bind(server_config).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
        }
    }

    info!("parley-server stopped");
}

/// Rewrite the single-dash `-port` / `-port=N` spelling to `--port` so clap
/// does not read it as `-p ort`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let rewritten = match arg.to_str() {
                Some("-port") => Some("--port".to_string()),
                Some(s) => s.strip_prefix("-port=").map(|v| format!("--port={v}")),
                None => None,
            };
            rewritten.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
