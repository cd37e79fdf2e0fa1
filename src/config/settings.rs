//! Resolved runtime settings.
//!
//! The raw [`GeoConfig`] is merged with environment fallbacks and defaults
//! exactly once at bootstrap. Nothing below this layer reads the environment.

use std::time::Duration;

use super::credentials::expand_secret;
use super::types::{GeoConfig, StoreBackend};
use crate::llm::catalog;

pub const DEFAULT_DB_PATH: &str = "./.geoscope/geoscope.db";
pub const DEFAULT_SEED_QUERY: &str = "what is {brand}";

const SERVERLESS_MARKERS: &[&str] = &[
    "VERCEL",
    "K_SERVICE",
    "FUNCTION_TARGET",
    "AWS_LAMBDA_FUNCTION_NAME",
    "FIREBASE_CONFIG",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Sqlite { path: String },
    Memory,
}

/// Launch profile for the local headless browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserMode {
    /// Single-process, no sandbox, no GPU, no shared memory.
    Serverless,
    Standard,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub internal_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub scraper_url: Option<String>,
    pub remote_only: bool,
    pub remote_timeout: Duration,
    pub local_attempts: u32,
    pub local_retry_delay: Duration,
    pub nav_timeout: Duration,
    pub sidecar_timeout: Duration,
    pub min_content_chars: usize,
    pub chrome_path: Option<String>,
    pub browser_mode: BrowserMode,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            scraper_url: None,
            remote_only: false,
            remote_timeout: Duration::from_secs(120),
            local_attempts: 3,
            local_retry_delay: Duration::from_millis(2000),
            nav_timeout: Duration::from_secs(60),
            sidecar_timeout: Duration::from_secs(15),
            min_content_chars: 100,
            chrome_path: None,
            browser_mode: BrowserMode::Standard,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// In preference order; the first provider that answers wins.
    pub providers: Vec<ProviderSettings>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PageSpeedSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub strategy: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub seed_queries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub store: StoreConfig,
    pub fetch: FetchSettings,
    pub llm: LlmSettings,
    pub pagespeed: PageSpeedSettings,
    pub analysis: AnalysisSettings,
}

impl AppConfig {
    /// Resolve against the process environment.
    pub fn resolve(config: &GeoConfig) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Resolve using an explicit variable lookup.
    pub fn resolve_with<F>(config: &GeoConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |value: Option<&String>, var: &str| -> Option<String> {
            value
                .and_then(|v| expand_secret(v, &env))
                .or_else(|| env(var))
        };

        let server = config.server.clone().unwrap_or_default();
        let server = ServerSettings {
            host: server.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: server.port.unwrap_or(8080),
            internal_token: secret(server.internal_token.as_ref(), "GEOSCOPE_INTERNAL_TOKEN"),
        };

        let store_section = config.store.clone().unwrap_or_default();
        let store = match store_section.backend.unwrap_or_default() {
            StoreBackend::Memory => StoreConfig::Memory,
            StoreBackend::Sqlite => StoreConfig::Sqlite {
                path: store_section
                    .path
                    .or_else(|| env("GEOSCOPE_DB"))
                    .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            },
        };

        let f = config.fetch.clone().unwrap_or_default();
        let defaults = FetchSettings::default();
        let serverless = f
            .serverless
            .unwrap_or_else(|| SERVERLESS_MARKERS.iter().any(|m| env(m).is_some()));
        let fetch = FetchSettings {
            scraper_url: f
                .scraper_url
                .or_else(|| env("SCRAPER_URL"))
                .map(|u| u.trim_end_matches('/').to_string()),
            remote_only: f.remote_only.unwrap_or(defaults.remote_only),
            remote_timeout: f.remote_timeout_secs.map(Duration::from_secs).unwrap_or(defaults.remote_timeout),
            local_attempts: f.local_attempts.unwrap_or(defaults.local_attempts),
            local_retry_delay: f
                .local_retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.local_retry_delay),
            nav_timeout: f.nav_timeout_secs.map(Duration::from_secs).unwrap_or(defaults.nav_timeout),
            sidecar_timeout: f
                .sidecar_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sidecar_timeout),
            min_content_chars: f.min_content_chars.unwrap_or(defaults.min_content_chars),
            chrome_path: f.chrome_path.or_else(|| env("CHROME_PATH")),
            browser_mode: if serverless { BrowserMode::Serverless } else { BrowserMode::Standard },
        };

        let llm_section = config.llm.clone().unwrap_or_default();
        let configured = llm_section.providers.unwrap_or_else(|| {
            catalog::KNOWN_PROVIDERS
                .iter()
                .map(|p| super::types::LLMProviderConfig {
                    provider: p.id.to_string(),
                    ..Default::default()
                })
                .collect()
        });
        let providers = configured
            .into_iter()
            .filter_map(|p| {
                let env_var = catalog::lookup(&p.provider).map(|info| info.key_var).unwrap_or("");
                let api_key = secret(p.api_key.as_ref(), env_var)?;
                Some(ProviderSettings {
                    model: p
                        .model
                        .unwrap_or_else(|| catalog::fallback_model(&p.provider).to_string()),
                    provider: p.provider,
                    api_key,
                    base_url: p.base_url,
                })
            })
            .collect();
        let llm = LlmSettings {
            providers,
            timeout: Duration::from_secs(llm_section.timeout_secs.unwrap_or(30)),
        };

        let psi = config.pagespeed.clone().unwrap_or_default();
        let pagespeed = PageSpeedSettings {
            api_key: secret(psi.api_key.as_ref(), "GOOGLE_PAGESPEED_API_KEY").or_else(|| env("GOOGLE_API_KEY")),
            base_url: psi.base_url.unwrap_or_else(|| {
                "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
            }),
            strategy: psi.strategy.unwrap_or_else(|| "MOBILE".to_string()),
            timeout: Duration::from_secs(psi.timeout_secs.unwrap_or(45)),
        };

        let analysis = AnalysisSettings {
            seed_queries: config
                .analysis
                .as_ref()
                .and_then(|a| a.seed_queries.clone())
                .filter(|q| !q.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_SEED_QUERY.to_string()]),
        };

        Self { server, store, fetch, llm, pagespeed, analysis }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = AppConfig::resolve_with(&GeoConfig::default(), lookup(&[]));
        assert_eq!(cfg.store, StoreConfig::Sqlite { path: DEFAULT_DB_PATH.to_string() });
        assert_eq!(cfg.fetch.local_attempts, 3);
        assert_eq!(cfg.fetch.remote_timeout, Duration::from_secs(120));
        assert_eq!(cfg.fetch.browser_mode, BrowserMode::Standard);
        assert!(cfg.llm.providers.is_empty());
        assert!(cfg.pagespeed.api_key.is_none());
        assert_eq!(cfg.analysis.seed_queries, vec!["what is {brand}".to_string()]);
    }

    #[test]
    fn test_serverless_detected_from_marker() {
        let cfg = AppConfig::resolve_with(&GeoConfig::default(), lookup(&[("K_SERVICE", "geo")]));
        assert_eq!(cfg.fetch.browser_mode, BrowserMode::Serverless);
    }

    #[test]
    fn test_providers_follow_env_keys_in_order() {
        let cfg = AppConfig::resolve_with(
            &GeoConfig::default(),
            lookup(&[("GEMINI_API_KEY", "g-key"), ("OPENAI_API_KEY", "o-key")]),
        );
        let names: Vec<_> = cfg.llm.providers.iter().map(|p| p.provider.as_str()).collect();
        assert_eq!(names, vec!["openai", "gemini"]);
        assert_eq!(cfg.llm.providers[1].api_key, "g-key");
    }

    #[test]
    fn test_pagespeed_key_falls_back_to_google_key() {
        let cfg = AppConfig::resolve_with(&GeoConfig::default(), lookup(&[("GOOGLE_API_KEY", "gk")]));
        assert_eq!(cfg.pagespeed.api_key.as_deref(), Some("gk"));
    }

    #[test]
    fn test_scraper_url_trailing_slash_trimmed() {
        let cfg = AppConfig::resolve_with(
            &GeoConfig::default(),
            lookup(&[("SCRAPER_URL", "http://scraper.internal/")]),
        );
        assert_eq!(cfg.fetch.scraper_url.as_deref(), Some("http://scraper.internal"));
    }

    #[test]
    fn test_memory_backend() {
        let config: GeoConfig = serde_yaml::from_str("store:\n  backend: memory\n").unwrap();
        let cfg = AppConfig::resolve_with(&config, lookup(&[]));
        assert_eq!(cfg.store, StoreConfig::Memory);
    }

    #[test]
    fn test_secret_reference_and_fallback() {
        let config: GeoConfig =
            serde_yaml::from_str("pagespeed:\n  api_key: $PSI\nserver:\n  internal_token: $UNSET\n").unwrap();
        let cfg = AppConfig::resolve_with(
            &config,
            lookup(&[("PSI", "psi-key"), ("GEOSCOPE_INTERNAL_TOKEN", "env-token")]),
        );
        assert_eq!(cfg.pagespeed.api_key.as_deref(), Some("psi-key"));
        assert_eq!(cfg.server.internal_token.as_deref(), Some("env-token"));
    }
}
