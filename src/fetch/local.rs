use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use super::browser::LocalRenderer;
use super::sidecar::fetch_sidecars;
use super::types::FetchedPage;
use crate::config::FetchSettings;
use crate::errors::{with_attempts, AttemptPolicy, GeoError};
use crate::models::FetchVia;

/// Local fallback path: bounded render attempts, then best-effort sidecars.
pub struct LocalFetcher {
    renderer: Arc<dyn LocalRenderer>,
    client: Client,
    policy: AttemptPolicy,
    min_content_chars: usize,
    sidecar_timeout: Duration,
}

impl LocalFetcher {
    pub fn new(renderer: Arc<dyn LocalRenderer>, settings: &FetchSettings) -> Self {
        Self {
            renderer,
            client: Client::new(),
            policy: AttemptPolicy {
                max_attempts: settings.local_attempts,
                delay: settings.local_retry_delay,
            },
            min_content_chars: settings.min_content_chars,
            sidecar_timeout: settings.sidecar_timeout,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, GeoError> {
        let min_chars = self.min_content_chars;
        let rendered = with_attempts("local_render", &self.policy, |attempt| {
            let renderer = Arc::clone(&self.renderer);
            let url = url.to_string();
            async move {
                info!(url = %url, attempt, "Rendering page locally");
                let page = renderer.render(&url).await?;
                let chars = page.text.trim().chars().count();
                if chars < min_chars {
                    return Err(GeoError::Scraping(format!(
                        "rendered text too short ({} chars, need {})",
                        chars, min_chars
                    )));
                }
                Ok(page)
            }
        })
        .await?;

        let (robots_txt, llms_txt) = fetch_sidecars(&self.client, url, self.sidecar_timeout).await;

        Ok(FetchedPage {
            html: rendered.html,
            content: rendered.text,
            robots_txt,
            llms_txt,
            performance: rendered.performance,
            via: FetchVia::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::fetch::types::RenderedPage;

    struct Flaky {
        calls: AtomicU32,
        fail_first: u32,
        error: fn() -> GeoError,
        text: String,
    }

    #[async_trait]
    impl LocalRenderer for Flaky {
        async fn render(&self, _url: &str) -> Result<RenderedPage, GeoError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err((self.error)());
            }
            Ok(RenderedPage {
                html: "<html></html>".into(),
                text: self.text.clone(),
                performance: None,
            })
        }
    }

    fn settings() -> FetchSettings {
        FetchSettings {
            local_retry_delay: Duration::ZERO,
            sidecar_timeout: Duration::from_millis(200),
            ..FetchSettings::default()
        }
    }

    // Sidecar lookups target a closed local port so they fail fast.
    const URL: &str = "http://127.0.0.1:9/";

    #[tokio::test]
    async fn test_retries_until_success() {
        let renderer = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 2,
            error: || GeoError::Scraping("reset".into()),
            text: "x".repeat(150),
        });
        let fetcher = LocalFetcher::new(renderer.clone(), &settings());
        let page = fetcher.fetch(URL).await.unwrap();
        assert_eq!(page.via, FetchVia::Fallback);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
        assert!(page.robots_txt.is_none());
    }

    #[tokio::test]
    async fn test_dns_failure_stops_after_one_attempt() {
        let renderer = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 10,
            error: || GeoError::DnsResolution("nope.invalid".into()),
            text: String::new(),
        });
        let fetcher = LocalFetcher::new(renderer.clone(), &settings());
        let err = fetcher.fetch(URL).await.unwrap_err();
        assert!(matches!(err, GeoError::DnsResolution(_)));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_text_exhausts_attempts() {
        let renderer = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_first: 0,
            error: || GeoError::Scraping("unused".into()),
            text: "too short".into(),
        });
        let fetcher = LocalFetcher::new(renderer.clone(), &settings());
        let err = fetcher.fetch(URL).await.unwrap_err();
        assert!(matches!(err, GeoError::Scraping(ref m) if m.contains("too short")));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
    }
}
