use async_trait::async_trait;

use super::types::RenderedPage;
use crate::config::{BrowserMode, FetchSettings};
use crate::errors::GeoError;

/// Desktop Chrome user agent presented by local renders.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

const CHROME_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/opt/google/chrome/google-chrome",
];

/// Renders one page in a headless browser. A single call is a single attempt.
#[async_trait]
pub trait LocalRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage, GeoError>;
}

/// Chrome flags for the detected runtime.
pub fn launch_args(mode: BrowserMode) -> Vec<&'static str> {
    let mut args = vec!["--disable-dev-shm-usage", "--disable-gpu", "--window-size=1920,1080"];
    if mode == BrowserMode::Serverless {
        args.extend(["--no-sandbox", "--single-process", "--no-zygote"]);
    }
    args
}

/// Map a navigation failure text to an error. Name resolution failures are
/// surfaced distinctly so callers stop retrying.
pub fn navigation_error(url: &str, error_text: &str) -> GeoError {
    if error_text.contains("ERR_NAME_NOT_RESOLVED") {
        let host = super::url::hostname(url).unwrap_or_else(|| url.to_string());
        GeoError::DnsResolution(host)
    } else {
        GeoError::Scraping(format!("navigation to {} failed: {}", url, error_text))
    }
}

/// Accept only a 2xx status for the main document. An unknown status is a
/// failed attempt.
pub fn check_document_status(url: &str, status: Option<i64>) -> Result<i64, GeoError> {
    match status {
        Some(code) if (200..300).contains(&code) => Ok(code),
        Some(code) => Err(GeoError::Scraping(format!("{} answered HTTP {}", url, code))),
        None => Err(GeoError::Scraping(format!("no response status for {}", url))),
    }
}

pub fn find_chrome(configured: Option<&str>) -> Result<std::path::PathBuf, GeoError> {
    if let Some(path) = configured {
        return Ok(std::path::PathBuf::from(path));
    }

    for path in CHROME_PATHS {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Ok(p.to_path_buf());
        }
    }

    for cmd in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(std::path::PathBuf::from(path));
                }
            }
        }
    }

    Err(GeoError::Browser(
        "Chrome/Chromium not found; install it or set CHROME_PATH".into(),
    ))
}

#[cfg(feature = "browser")]
mod chromium {
    use std::time::Duration;

    use async_trait::async_trait;
    use chromiumoxide::cdp::browser_protocol::network::{
        EventResponseReceived, LoaderId, ResourceType, SetUserAgentOverrideParams,
    };
    use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
    use chromiumoxide::listeners::EventStream;
    use chromiumoxide::{Browser, BrowserConfig};
    use futures::StreamExt;
    use serde_json::Value;
    use tracing::{debug, info};

    use super::{check_document_status, find_chrome, launch_args, navigation_error, LocalRenderer, USER_AGENT};
    use crate::config::{BrowserMode, FetchSettings};
    use crate::errors::GeoError;
    use crate::fetch::types::RenderedPage;

    const STATUS_SCRIPT: &str = r#"(() => {
        const nav = performance.getEntriesByType('navigation')[0];
        return nav && typeof nav.responseStatus === 'number' ? nav.responseStatus : 0;
    })()"#;

    const TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

    const PERFORMANCE_SCRIPT: &str = r#"(() => {
        const nav = performance.getEntriesByType('navigation')[0];
        return nav ? nav.toJSON() : JSON.parse(JSON.stringify(performance.timing));
    })()"#;

    /// How long to wait for the document response event once navigation is done.
    const STATUS_WAIT: Duration = Duration::from_secs(2);

    fn cdp_error(e: impl std::fmt::Display) -> GeoError {
        GeoError::Browser(e.to_string())
    }

    /// Status of the main document response for the navigation `loader_id`.
    async fn document_status(
        responses: &mut EventStream<EventResponseReceived>,
        loader_id: Option<&LoaderId>,
    ) -> Option<i64> {
        let wait = async {
            while let Some(event) = responses.next().await {
                let same_load = loader_id.map_or(true, |id| &event.loader_id == id);
                if event.r#type == ResourceType::Document && same_load {
                    return Some(event.response.status);
                }
            }
            None
        };
        tokio::time::timeout(STATUS_WAIT, wait).await.ok().flatten()
    }

    /// Launches a fresh headless Chromium for every render.
    pub struct ChromiumRenderer {
        chrome_path: Option<String>,
        mode: BrowserMode,
        nav_timeout: Duration,
    }

    impl ChromiumRenderer {
        pub fn new(settings: &FetchSettings) -> Self {
            Self {
                chrome_path: settings.chrome_path.clone(),
                mode: settings.browser_mode,
                nav_timeout: settings.nav_timeout,
            }
        }

        async fn launch(&self) -> Result<(Browser, tokio::task::JoinHandle<()>), GeoError> {
            let chrome = find_chrome(self.chrome_path.as_deref())?;
            info!(chrome = %chrome.display(), mode = ?self.mode, "Launching Chromium");

            let mut builder = BrowserConfig::builder().chrome_executable(chrome);
            for arg in launch_args(self.mode) {
                builder = builder.arg(arg);
            }
            let config = builder
                .build()
                .map_err(|e| GeoError::Browser(format!("failed to build browser config: {}", e)))?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| GeoError::Browser(format!("failed to launch browser: {}", e)))?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok((browser, handle))
        }

        async fn load(&self, browser: &Browser, url: &str) -> Result<RenderedPage, GeoError> {
            let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
            page.execute(SetUserAgentOverrideParams::new(USER_AGENT.to_string()))
                .await
                .map_err(cdp_error)?;

            let mut responses = page
                .event_listener::<EventResponseReceived>()
                .await
                .map_err(cdp_error)?;

            let nav = NavigateParams::builder()
                .url(url)
                .build()
                .map_err(|e| GeoError::Validation(format!("invalid url: {}", e)))?;
            let response = page.execute(nav).await.map_err(cdp_error)?;
            if let Some(error_text) = response.result.error_text.as_deref() {
                let _ = page.close().await;
                return Err(navigation_error(url, error_text));
            }
            page.wait_for_navigation().await.map_err(cdp_error)?;

            let mut observed = document_status(&mut responses, response.result.loader_id.as_ref()).await;
            if observed.is_none() {
                observed = page
                    .evaluate(STATUS_SCRIPT.to_string())
                    .await
                    .ok()
                    .and_then(|r| r.into_value::<i64>().ok())
                    .filter(|code| *code > 0);
            }
            let status = match check_document_status(url, observed) {
                Ok(code) => code,
                Err(e) => {
                    let _ = page.close().await;
                    return Err(e);
                }
            };

            let html = page.content().await.map_err(cdp_error)?;
            let text: String = page
                .evaluate(TEXT_SCRIPT.to_string())
                .await
                .map_err(cdp_error)?
                .into_value()
                .map_err(cdp_error)?;
            let performance: Option<Value> = page
                .evaluate(PERFORMANCE_SCRIPT.to_string())
                .await
                .ok()
                .and_then(|r| r.into_value().ok());

            let _ = page.close().await;
            debug!(url, status, chars = text.chars().count(), "Local render complete");

            Ok(RenderedPage { html, text, performance })
        }
    }

    #[async_trait]
    impl LocalRenderer for ChromiumRenderer {
        async fn render(&self, url: &str) -> Result<RenderedPage, GeoError> {
            let (mut browser, handle) = self.launch().await?;
            let outcome = tokio::time::timeout(self.nav_timeout, self.load(&browser, url)).await;
            let _ = browser.close().await;
            handle.abort();

            match outcome {
                Ok(result) => result,
                Err(_) => Err(GeoError::Scraping(format!(
                    "navigation to {} timed out after {}s",
                    url,
                    self.nav_timeout.as_secs()
                ))),
            }
        }
    }
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumRenderer;

#[cfg(not(feature = "browser"))]
pub struct ChromiumRenderer;

#[cfg(not(feature = "browser"))]
impl ChromiumRenderer {
    pub fn new(_settings: &FetchSettings) -> Self {
        Self
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl LocalRenderer for ChromiumRenderer {
    async fn render(&self, _url: &str) -> Result<RenderedPage, GeoError> {
        Err(GeoError::Config(
            "browser support not compiled; rebuild with --features browser".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serverless_args() {
        let args = launch_args(BrowserMode::Serverless);
        assert!(args.contains(&"--no-sandbox"));
        assert!(args.contains(&"--single-process"));
        assert!(args.contains(&"--window-size=1920,1080"));
    }

    #[test]
    fn test_standard_args_keep_sandbox() {
        let args = launch_args(BrowserMode::Standard);
        assert!(!args.contains(&"--no-sandbox"));
    }

    #[test]
    fn test_only_2xx_document_status_accepted() {
        assert_eq!(check_document_status("https://example.com/", Some(200)).unwrap(), 200);
        for status in [Some(301), Some(404), Some(503), None] {
            let err = check_document_status("https://example.com/", status).unwrap_err();
            assert!(matches!(err, GeoError::Scraping(_)));
        }
    }

    #[test]
    fn test_dns_failure_is_distinct() {
        let err = navigation_error("https://nope.invalid/", "net::ERR_NAME_NOT_RESOLVED");
        assert!(matches!(err, GeoError::DnsResolution(ref h) if h == "nope.invalid"));
        assert!(!err.classify().retryable);
    }

    #[test]
    fn test_other_navigation_failure_is_retryable() {
        let err = navigation_error("https://example.com/", "net::ERR_CONNECTION_RESET");
        assert!(matches!(err, GeoError::Scraping(_)));
        assert!(err.classify().retryable);
    }

    #[test]
    fn test_configured_chrome_path_wins() {
        let p = find_chrome(Some("/custom/chrome")).unwrap();
        assert_eq!(p, std::path::PathBuf::from("/custom/chrome"));
    }
}
