//! Page server and HTTP fetcher end to end.

use std::sync::Arc;
use std::time::Duration;

use japa::client::{FetchError, HttpPageFetcher, PageFetcher, RetryPolicy, RetryingFetcher};
use japa::core::Cursor;
use japa::server::{self, ServerConfig};
use japa::store::MemoryStore;

use crate::fixtures::session::{SessionRig, ids};

fn local_server(delay: Duration) -> server::ServerHandle {
    server::start(ServerConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        response_delay: delay,
    })
    .expect("start page server")
}

#[test]
fn http_fetcher_reads_server_pages() {
    let server = local_server(Duration::ZERO);
    let fetcher = HttpPageFetcher::new(server.base_url(), Duration::from_secs(5));

    let page = fetcher.fetch_page(Cursor(216)).unwrap();
    assert_eq!(page.first_id().map(|id| id.get()), Some(216));
    assert_eq!(page.items().len(), 108);
    assert_eq!(page.next_cursor(), Some(Cursor(324)));
    assert_eq!(page.previous_cursor(), Some(Cursor(108)));

    let past_end = fetcher.fetch_page(Cursor(1500)).unwrap();
    assert!(past_end.is_empty());
    assert_eq!(past_end.next_cursor(), None);
}

#[test]
fn slow_server_times_out() {
    let server = local_server(Duration::from_millis(500));
    let fetcher = HttpPageFetcher::new(server.base_url(), Duration::from_millis(100));

    let err = fetcher.fetch_page(Cursor(0)).unwrap_err();
    assert!(
        matches!(err, FetchError::Timeout | FetchError::Transport { .. }),
        "{err:?}"
    );
    assert!(err.transience().is_retryable());
}

#[test]
fn unreachable_server_exhausts_retries() {
    let addr = {
        let server = local_server(Duration::ZERO);
        server.addr()
    };
    let fetcher = RetryingFetcher::new(
        HttpPageFetcher::new(format!("http://{addr}"), Duration::from_millis(200)),
        RetryPolicy {
            max_attempts: 2,
            backoff_base: Duration::from_millis(10),
            backoff_max: Duration::from_millis(10),
        },
    );

    let err = fetcher.fetch_page(Cursor(0)).unwrap_err();
    assert!(
        matches!(err, FetchError::RetriesExhausted { attempts: 2, .. }),
        "{err:?}"
    );
}

#[test]
fn session_over_http() {
    let server = local_server(Duration::from_millis(20));
    let fetcher = Arc::new(HttpPageFetcher::new(
        server.base_url(),
        Duration::from_secs(5),
    ));
    let mut rig = SessionRig::start_with(MemoryStore::with_done(ids(0..3)), fetcher);

    let view = rig.wait_ready();
    assert_eq!(view.model.pages[0].beads[0].id.get(), 3);
    assert!(view.model.pages[0].beads[0].name.starts_with("Project 3"));
}
