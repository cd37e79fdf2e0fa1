//! Durable job documents with partial-merge updates and an append-only event log.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::errors::GeoError;
use crate::models::{AnalysisJob, JobEvent, JobPatch, JobSummary};

pub use memory::MemoryJobStore;
pub use sqlite::SqliteJobStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<AnalysisJob>, GeoError>;

    /// Insert a new job. An existing id is a [`GeoError::Conflict`].
    async fn create(&self, job: &AnalysisJob) -> Result<(), GeoError>;

    /// Merge `patch` into the stored job and return the result.
    ///
    /// `updatedAt` is always restamped. A missing job is [`GeoError::NotFound`].
    async fn update(&self, id: &str, patch: JobPatch) -> Result<AnalysisJob, GeoError>;

    async fn append_event(&self, id: &str, event: JobEvent) -> Result<(), GeoError>;

    async fn events(&self, id: &str) -> Result<Vec<JobEvent>, GeoError>;

    /// Most recent jobs first.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<JobSummary>, GeoError>;
}

pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn JobStore>, GeoError> {
    match config {
        StoreConfig::Sqlite { path } => Ok(Arc::new(SqliteJobStore::open(path)?)),
        StoreConfig::Memory => Ok(Arc::new(MemoryJobStore::new())),
    }
}
