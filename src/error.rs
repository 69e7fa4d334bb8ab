use thiserror::Error;

use crate::client::SessionError;
use crate::client::fetcher::FetchError;
use crate::config::ConfigError;
use crate::core::CoreError;
use crate::server::ServerError;
use crate::store::StoreError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// Crate-level error for the CLI and other callers spanning capabilities.
///
/// Each variant wraps the error of one capability unchanged.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Core(e) => e.transience(),
            Error::Store(e) => e.transience(),
            Error::Fetch(e) => e.transience(),
            Error::Session(e) => e.transience(),
            Error::Config(_) => Transience::Permanent,
            Error::Server(e) => e.transience(),
            Error::Io(_) => Transience::Unknown,
            Error::Json(_) => Transience::Permanent,
        }
    }
}
