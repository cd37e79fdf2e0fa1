use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use geoscope::config::FetchSettings;
use geoscope::errors::GeoError;
use geoscope::fetch::{ContentFetcher, FallbackFetcher, LocalFetcher, LocalRenderer, RemoteScraper, RenderedPage};
use geoscope::models::FetchVia;

const LONG_TEXT: &str = "Rendered locally. This text is long enough to pass the minimum content check that \
    the local fetch path applies to every render attempt.";

async fn scrape(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let url = body["url"].as_str().unwrap_or_default();
    if url.contains("blocked") {
        return (StatusCode::OK, Json(json!({ "ok": false, "error": "blocked by bot protection" })));
    }
    if url.contains("overloaded") {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "ok": true, "content": "stale" })));
    }
    if url.contains("slow") {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    (StatusCode::OK, Json(json!({
        "ok": true,
        "html": "<html><body>remote</body></html>",
        "content": "Remote content",
        "robotsTxt": "User-agent: *",
        "performance": { "ttfb": 120 }
    })))
}

/// Stub scraping backend that also serves a robots.txt.
async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/scrape", post(scrape))
        .route("/robots.txt", get(|| async { "User-agent: *\nDisallow:" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

struct CountingRenderer {
    calls: AtomicUsize,
}

#[async_trait]
impl LocalRenderer for CountingRenderer {
    async fn render(&self, _url: &str) -> Result<RenderedPage, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RenderedPage {
            html: "<html><body>local</body></html>".to_string(),
            text: LONG_TEXT.to_string(),
            performance: None,
        })
    }
}

fn settings() -> FetchSettings {
    FetchSettings {
        local_retry_delay: Duration::from_millis(10),
        sidecar_timeout: Duration::from_secs(2),
        ..FetchSettings::default()
    }
}

fn fetcher(addr: SocketAddr, renderer: Arc<CountingRenderer>, remote_only: bool) -> FallbackFetcher {
    fetcher_with_timeout(addr, renderer, remote_only, Duration::from_secs(5))
}

fn fetcher_with_timeout(
    addr: SocketAddr,
    renderer: Arc<CountingRenderer>,
    remote_only: bool,
    remote_timeout: Duration,
) -> FallbackFetcher {
    let settings = settings();
    let remote = RemoteScraper::new(&format!("http://{addr}"), remote_timeout);
    let local = LocalFetcher::new(renderer, &settings);
    FallbackFetcher::new(Some(remote), Some(local), remote_only)
}

#[tokio::test]
async fn test_remote_success_skips_local() {
    let addr = spawn_backend().await;
    let renderer = Arc::new(CountingRenderer { calls: AtomicUsize::new(0) });
    let fetcher = fetcher(addr, renderer.clone(), false);

    let page = fetcher.fetch("https://example.com").await.unwrap();

    assert_eq!(page.via, FetchVia::Primary);
    assert_eq!(page.content, "Remote content");
    assert_eq!(page.robots_txt.as_deref(), Some("User-agent: *"));
    assert_eq!(page.meta().performance.unwrap()["ttfb"], 120);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_remote_not_ok_falls_back_once() {
    let addr = spawn_backend().await;
    let renderer = Arc::new(CountingRenderer { calls: AtomicUsize::new(0) });
    let fetcher = fetcher(addr, renderer.clone(), false);

    // The target is the stub itself so sidecar fetches resolve locally.
    let target = format!("http://{addr}/blocked");
    let page = fetcher.fetch(&target).await.unwrap();

    assert_eq!(page.via, FetchVia::Fallback);
    assert_eq!(page.content, LONG_TEXT);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(page.robots_txt.as_deref(), Some("User-agent: *\nDisallow:"));
    assert!(page.llms_txt.is_none());
}

#[tokio::test]
async fn test_remote_only_never_renders_locally() {
    let addr = spawn_backend().await;
    let renderer = Arc::new(CountingRenderer { calls: AtomicUsize::new(0) });
    let fetcher = fetcher(addr, renderer.clone(), true);

    let err = fetcher.fetch("https://blocked.example").await.unwrap_err();

    assert!(matches!(err, GeoError::Scraping(_)));
    assert!(err.to_string().contains("bot protection"));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_backend_falls_back() {
    let renderer = Arc::new(CountingRenderer { calls: AtomicUsize::new(0) });
    let settings = settings();
    let remote = RemoteScraper::new("http://127.0.0.1:9", Duration::from_secs(2));
    let local = LocalFetcher::new(renderer.clone(), &settings);
    let fetcher = FallbackFetcher::new(Some(remote), Some(local), false);

    let page = fetcher.fetch("http://127.0.0.1:9/").await.unwrap();

    assert_eq!(page.via, FetchVia::Fallback);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert!(page.robots_txt.is_none());
}

#[tokio::test]
async fn test_remote_error_status_falls_back_despite_ok_body() {
    let addr = spawn_backend().await;
    let renderer = Arc::new(CountingRenderer { calls: AtomicUsize::new(0) });
    let fetcher = fetcher(addr, renderer.clone(), false);

    let page = fetcher.fetch(&format!("http://{addr}/overloaded")).await.unwrap();

    assert_eq!(page.via, FetchVia::Fallback);
    assert_eq!(page.content, LONG_TEXT);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remote_timeout_falls_back() {
    let addr = spawn_backend().await;
    let renderer = Arc::new(CountingRenderer { calls: AtomicUsize::new(0) });
    let fetcher = fetcher_with_timeout(addr, renderer.clone(), false, Duration::from_millis(200));

    let started = std::time::Instant::now();
    let page = fetcher.fetch(&format!("http://{addr}/slow")).await.unwrap();

    assert_eq!(page.via, FetchVia::Fallback);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}
