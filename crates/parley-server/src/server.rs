//! Connection acceptor: binds the listener and spawns one session per peer.
//!
//! Sessions share nothing; a failure in one (log file cannot be opened,
//! peer vanishes) is logged and never reaches the accept loop or other
//! sessions.

use crate::config::ServerConfig;
use crate::session::{LineReader, Session, SessionLog, SessionState};
use parley_core::{ParleyError, ParleyResult};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// The parley server instance.
pub struct ParleyServer {
    config: Arc<ServerConfig>,
    listener: TcpListener,
}

impl ParleyServer {
    /// Bind the listening socket. Failure here is fatal to startup.
    pub async fn bind(config: ServerConfig) -> ParleyResult<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ParleyError::Bind { addr, source })?;

        Ok(Self {
            config: Arc::new(config),
            listener,
        })
    }

    pub fn local_addr(&self) -> ParleyResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process is stopped.
    pub async fn run(self) -> ParleyResult<()> {
        info!(addr = %self.local_addr()?, "parley-server listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(&config, stream, peer).await {
                            warn!(peer = %peer, error = %e, "dropping connection");
                        }
                    });
                }
                Err(e) => on_accept_error(&e).await,
            }
        }
    }
}

async fn on_accept_error(e: &std::io::Error) {
    error!(error = %e, "TCP accept failed");
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Run one session to completion. The stream is closed when this returns.
async fn handle_connection(
    config: &ServerConfig,
    stream: TcpStream,
    peer: SocketAddr,
) -> ParleyResult<SessionState> {
    let log = SessionLog::open(&config.log_dir, peer.ip()).await?;
    info!(peer = %peer, log = %log.path().display(), "peer connected");

    let (read_half, write_half) = stream.into_split();
    let lines = LineReader::spawn(read_half, peer);
    let session = Session::start(peer, write_half, log, config.idle_timeout).await;
    Ok(session.run(lines).await)
}
