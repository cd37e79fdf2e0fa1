use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::types::FetchedPage;
use crate::errors::GeoError;
use crate::models::FetchVia;

/// Body returned by `POST {backend}/scrape`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeResponse {
    #[serde(default)]
    ok: bool,
    html: Option<String>,
    content: Option<String>,
    robots_txt: Option<String>,
    llms_txt: Option<String>,
    performance: Option<Value>,
    error: Option<String>,
}

/// Client for the remote scraping backend.
#[derive(Clone)]
pub struct RemoteScraper {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteScraper {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Succeeds only on a 2xx response whose body carries `ok: true`.
    pub async fn scrape(&self, url: &str) -> Result<FetchedPage, GeoError> {
        let endpoint = format!("{}/scrape", self.base_url);
        debug!(endpoint = %endpoint, url, "Requesting remote scrape");

        let request = self.client.post(&endpoint).json(&json!({ "url": url })).send();
        let resp = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                GeoError::Timeout(format!("remote scrape timed out after {}s", self.timeout.as_secs()))
            })?
            .map_err(|e| GeoError::Network(format!("remote scrape request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeoError::Scraping(format!("remote scraper returned HTTP {}", status.as_u16())));
        }

        let body = tokio::time::timeout(self.timeout, resp.json::<ScrapeResponse>())
            .await
            .map_err(|_| GeoError::Timeout("remote scrape body timed out".into()))?
            .map_err(|e| GeoError::Scraping(format!("remote scraper sent an unreadable body: {}", e)))?;

        if !body.ok {
            return Err(GeoError::Scraping(
                body.error.unwrap_or_else(|| "remote scraper reported failure".to_string()),
            ));
        }

        let content = body.content.unwrap_or_default();
        let html = body.html.unwrap_or_default();
        if content.is_empty() && html.is_empty() {
            return Err(GeoError::Scraping("remote scraper returned no content".into()));
        }

        Ok(FetchedPage {
            html,
            content,
            robots_txt: body.robots_txt,
            llms_txt: body.llms_txt,
            performance: body.performance,
            via: FetchVia::Primary,
        })
    }
}
