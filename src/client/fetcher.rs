//! Page fetchers.
//!
//! - `HttpPageFetcher` - `GET /api/projects?cursor=N` over HTTP with a timeout
//! - `LocalPageFetcher` - the server's page function, in-process
//! - `RetryingFetcher` - bounded retry with exponential backoff around another fetcher

use std::io::Read;
use std::time::Duration;

use thiserror::Error;

use crate::api::ProjectsResponse;
use crate::core::{CoreError, Cursor, Page};
use crate::error::Transience;
use crate::server::{now_ms, page_at};

pub trait PageFetcher: Send + Sync {
    fn fetch_page(&self, cursor: Cursor) -> Result<Page, FetchError>;
}

#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum FetchError {
    #[error("page request failed: {reason}")]
    Transport { reason: String },
    #[error("page request timed out")]
    Timeout,
    #[error("page request returned http status {code}")]
    Status { code: u16 },
    #[error("page response could not be decoded: {reason}")]
    Decode { reason: String },
    #[error(transparent)]
    InvalidPage(#[from] CoreError),
    #[error("page request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    pub fn transience(&self) -> Transience {
        match self {
            FetchError::Transport { .. } | FetchError::Timeout => Transience::Retryable,
            FetchError::Status { code } if *code == 429 || *code >= 500 => Transience::Retryable,
            FetchError::Status { .. } | FetchError::Decode { .. } | FetchError::InvalidPage(_) => {
                Transience::Permanent
            }
            FetchError::RetriesExhausted { .. } => Transience::Unknown,
        }
    }
}

pub struct HttpPageFetcher {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpPageFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/projects", self.base_url)
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch_page(&self, cursor: Cursor) -> Result<Page, FetchError> {
        let resp = self
            .agent
            .get(&self.endpoint())
            .query("cursor", &cursor.to_string())
            .set("User-Agent", "japa-counter")
            .call()
            .map_err(map_ureq_error)?;
        let mut body = String::new();
        resp.into_reader()
            .read_to_string(&mut body)
            .map_err(|e| FetchError::Transport {
                reason: format!("failed to read page body: {e}"),
            })?;
        let decoded: ProjectsResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode {
                reason: e.to_string(),
            })?;
        Ok(decoded.into_page(cursor)?)
    }
}

fn map_ureq_error(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::Status { code },
        ureq::Error::Transport(transport) if is_timeout(&transport) => FetchError::Timeout,
        ureq::Error::Transport(transport) => FetchError::Transport {
            reason: transport.to_string(),
        },
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        })
}

/// Serves pages from the in-process page function.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalPageFetcher;

impl PageFetcher for LocalPageFetcher {
    fn fetch_page(&self, cursor: Cursor) -> Result<Page, FetchError> {
        Ok(page_at(cursor.get(), now_ms()).into_page(cursor)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_secs(5),
        }
    }
}

pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: PageFetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<F: PageFetcher> PageFetcher for RetryingFetcher<F> {
    fn fetch_page(&self, cursor: Cursor) -> Result<Page, FetchError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match self.inner.fetch_page(cursor) {
                Ok(page) => return Ok(page),
                Err(err) => err,
            };
            if !err.transience().is_retryable() {
                return Err(err);
            }
            if attempt >= attempts {
                if attempts == 1 {
                    return Err(err);
                }
                return Err(FetchError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }
            let delay = self.policy.backoff(attempt);
            tracing::debug!(%cursor, attempt, ?delay, "retrying page fetch: {err}");
            std::thread::sleep(delay);
            attempt += 1;
        }
    }
}
