//! Paginated bead server.

mod http;
mod projects;

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::error::Transience;

pub use http::{ServerHandle, router, start};
pub use projects::{cursor_param, now_ms, page_at, parse_cursor};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Artificial latency added to every page response.
    pub response_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            response_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start server runtime: {source}")]
    Runtime {
        #[source]
        source: std::io::Error,
    },
}

impl ServerError {
    pub fn transience(&self) -> Transience {
        match self {
            ServerError::Bind { source, .. }
                if source.kind() == std::io::ErrorKind::AddrInUse =>
            {
                Transience::Retryable
            }
            ServerError::Bind { .. } => Transience::Permanent,
            ServerError::Runtime { .. } => Transience::Unknown,
        }
    }
}
