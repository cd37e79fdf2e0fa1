use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::url::origin_path;

/// Fetch `robots.txt` and `llms.txt` for the page's origin.
///
/// Failures of any kind yield `None` for that file.
pub async fn fetch_sidecars(client: &Client, url: &str, timeout: Duration) -> (Option<String>, Option<String>) {
    tokio::join!(
        fetch_text(client, url, "/robots.txt", timeout),
        fetch_text(client, url, "/llms.txt", timeout),
    )
}

async fn fetch_text(client: &Client, url: &str, path: &str, timeout: Duration) -> Option<String> {
    let target = origin_path(url, path)?;
    let resp = match client.get(&target).timeout(timeout).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            debug!(target = %target, status = resp.status().as_u16(), "Sidecar not available");
            return None;
        }
        Err(e) => {
            debug!(target = %target, error = %e, "Sidecar fetch failed");
            return None;
        }
    };
    resp.text().await.ok().filter(|body| !body.trim().is_empty())
}
