pub mod browser;
pub mod fallback;
pub mod local;
pub mod remote;
pub mod sidecar;
pub mod types;
pub mod url;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::FetchSettings;
use crate::errors::GeoError;

pub use browser::{ChromiumRenderer, LocalRenderer};
pub use fallback::FallbackFetcher;
pub use local::LocalFetcher;
pub use remote::RemoteScraper;
pub use types::{FetchedPage, RenderedPage};

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, GeoError>;
}

/// Assemble the configured fetch chain. With `remote_only` no local browser
/// is ever launched.
pub fn build_fetcher(settings: &FetchSettings) -> Arc<dyn ContentFetcher> {
    let remote = settings
        .scraper_url
        .as_deref()
        .map(|base| RemoteScraper::new(base, settings.remote_timeout));
    let local = if settings.remote_only {
        None
    } else {
        let renderer: Arc<dyn LocalRenderer> = Arc::new(ChromiumRenderer::new(settings));
        Some(LocalFetcher::new(renderer, settings))
    };
    Arc::new(FallbackFetcher::new(remote, local, settings.remote_only))
}
