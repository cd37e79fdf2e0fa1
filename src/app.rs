use std::sync::Arc;

use tracing::warn;

use crate::analyzers::{AnalysisService, LlmAnalysisService, PageSpeedClient, PerformanceProbe};
use crate::config::AppConfig;
use crate::errors::GeoError;
use crate::fetch::{build_fetcher, ContentFetcher};
use crate::llm::build_chain;
use crate::pipeline::AnalysisOrchestrator;
use crate::store::{build_store, JobStore};

/// External collaborators, built once at startup and shared by every job.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn JobStore>,
    pub fetcher: Arc<dyn ContentFetcher>,
    pub performance: Arc<dyn PerformanceProbe>,
    pub ai: Arc<dyn AnalysisService>,
    pub seed_queries: Vec<String>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self, GeoError> {
        let store = build_store(&config.store)?;
        let fetcher = build_fetcher(&config.fetch);
        let performance: Arc<dyn PerformanceProbe> = Arc::new(PageSpeedClient::new(&config.pagespeed));

        let chain = build_chain(&config.llm)?;
        if chain.is_empty() {
            warn!("No AI providers configured; analysis stages will fail");
        }
        if config.pagespeed.api_key.is_none() {
            warn!("No PageSpeed API key; the performance stage will fail");
        }

        Ok(Self {
            store,
            fetcher,
            performance,
            ai: Arc::new(LlmAnalysisService::new(chain)),
            seed_queries: config.analysis.seed_queries.clone(),
        })
    }

    /// A fresh orchestrator with its own cancel token.
    pub fn orchestrator(&self) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.performance),
            Arc::clone(&self.ai),
            self.seed_queries.clone(),
        )
    }
}
