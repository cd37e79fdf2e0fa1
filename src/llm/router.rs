use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{LlmSettings, ProviderSettings};
use crate::errors::GeoError;
use super::catalog;
use super::chain::ProviderChain;
use super::gemini::GeminiProvider;
use super::openai::OpenAIProvider;
use super::provider::AiProvider;

/// Instantiate one configured provider. An unset `base_url` falls back to the
/// provider's public API.
pub fn create_provider(
    settings: &ProviderSettings,
    timeout: Duration,
) -> Result<Arc<dyn AiProvider>, GeoError> {
    let known = catalog::lookup(&settings.provider)
        .ok_or_else(|| GeoError::Config(format!("Unknown LLM provider: {}", settings.provider)))?;
    let base_url = settings.base_url.as_deref().unwrap_or(known.api_base);
    let provider: Arc<dyn AiProvider> = match known.id {
        "gemini" => Arc::new(GeminiProvider::new(&settings.api_key, &settings.model, base_url, timeout)?),
        _ => Arc::new(OpenAIProvider::new(&settings.api_key, &settings.model, base_url, timeout)?),
    };
    Ok(provider)
}

/// Build the provider chain in configured preference order.
pub fn build_chain(settings: &LlmSettings) -> Result<ProviderChain, GeoError> {
    let providers = settings
        .providers
        .iter()
        .map(|p| create_provider(p, settings.timeout))
        .collect::<Result<Vec<_>, _>>()?;
    let chain = ProviderChain::new(providers);
    info!(providers = ?chain.names(), "AI provider chain ready");
    Ok(chain)
}
