use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the parley server and protocol layer.
#[derive(Debug, Error)]
pub enum ParleyError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ParleyResult<T> = Result<T, ParleyError>;
