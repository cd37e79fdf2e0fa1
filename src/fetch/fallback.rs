use async_trait::async_trait;
use tracing::{info, warn};

use super::local::LocalFetcher;
use super::remote::RemoteScraper;
use super::types::FetchedPage;
use super::ContentFetcher;
use crate::errors::GeoError;

/// Remote backend first, local browser second.
pub struct FallbackFetcher {
    remote: Option<RemoteScraper>,
    local: Option<LocalFetcher>,
    remote_only: bool,
}

impl FallbackFetcher {
    pub fn new(remote: Option<RemoteScraper>, local: Option<LocalFetcher>, remote_only: bool) -> Self {
        Self { remote, local, remote_only }
    }
}

#[async_trait]
impl ContentFetcher for FallbackFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, GeoError> {
        let mut remote_error = None;

        if let Some(remote) = &self.remote {
            match remote.scrape(url).await {
                Ok(page) => {
                    info!(url, backend = remote.base_url(), "Fetched via remote scraper");
                    return Ok(page);
                }
                Err(e) if self.remote_only => return Err(e),
                Err(e) => {
                    warn!(url, error = %e, "Remote scrape failed, falling back to local browser");
                    remote_error = Some(e);
                }
            }
        } else if self.remote_only {
            return Err(GeoError::Config("remote_only is set but no scraper_url is configured".into()));
        }

        match &self.local {
            Some(local) => local.fetch(url).await,
            None => Err(remote_error
                .unwrap_or_else(|| GeoError::Config("no fetch path configured".into()))),
        }
    }
}
