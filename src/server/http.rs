//! HTTP surface of the page server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::projects::{cursor_param, now_ms, page_at, parse_cursor};
use super::{ServerConfig, ServerError};
use crate::api::{HealthStatus, ProjectsResponse};

struct ServerState {
    response_delay: Duration,
}

pub fn router(config: &ServerConfig) -> Router {
    let state = Arc::new(ServerState {
        response_delay: config.response_delay,
    });
    Router::new()
        .route("/api/projects", get(handle_projects))
        .route("/api/health", get(handle_health))
        .with_state(state)
}

async fn handle_projects(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<ProjectsResponse> {
    let cursor = parse_cursor(cursor_param(&params));
    if !state.response_delay.is_zero() {
        tokio::time::sleep(state.response_delay).await;
    }
    tracing::debug!(cursor, "serving page");
    Json(page_at(cursor, now_ms()))
}

async fn handle_health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

/// Running page server. Dropping the handle stops it.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address actually bound (resolves port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections, finish in-flight requests, and wait.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("page server thread panicked");
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Bind `config.listen_addr` and serve on a background runtime.
pub fn start(config: ServerConfig) -> Result<ServerHandle, ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("japa-http")
        .enable_all()
        .build()
        .map_err(|source| ServerError::Runtime { source })?;

    let listen_addr = config.listen_addr;
    let listener = runtime
        .block_on(TcpListener::bind(listen_addr))
        .map_err(|source| ServerError::Bind {
            addr: listen_addr,
            source,
        })?;
    let addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind {
            addr: listen_addr,
            source,
        })?;

    let app = router(&config);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let thread = std::thread::Builder::new()
        .name("japa-server".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                let served = axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!("page server stopped: {e}");
                }
            });
        })
        .map_err(|source| ServerError::Runtime { source })?;

    tracing::info!(%addr, delay_ms = config.response_delay.as_millis() as u64, "page server listening");
    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        thread: Some(thread),
    })
}
