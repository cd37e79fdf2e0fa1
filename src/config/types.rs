use serde::{Deserialize, Serialize};

/// On-disk configuration. Every section is optional; gaps are filled from the
/// environment and defaults by [`crate::config::resolve`].
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GeoConfig {
    pub server: Option<ServerConfig>,
    pub store: Option<StoreSection>,
    pub fetch: Option<FetchConfig>,
    pub llm: Option<LLMConfig>,
    pub pagespeed: Option<PageSpeedConfig>,
    pub analysis: Option<AnalysisConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub internal_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StoreSection {
    pub backend: Option<StoreBackend>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FetchConfig {
    pub scraper_url: Option<String>,
    pub remote_only: Option<bool>,
    pub remote_timeout_secs: Option<u64>,
    pub local_attempts: Option<u32>,
    pub local_retry_delay_ms: Option<u64>,
    pub nav_timeout_secs: Option<u64>,
    pub sidecar_timeout_secs: Option<u64>,
    pub min_content_chars: Option<usize>,
    pub chrome_path: Option<String>,
    pub serverless: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LLMConfig {
    pub providers: Option<Vec<LLMProviderConfig>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LLMProviderConfig {
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PageSpeedConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub strategy: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AnalysisConfig {
    /// Seed queries for the generative stage; `{brand}` is substituted.
    pub seed_queries: Option<Vec<String>>,
}
