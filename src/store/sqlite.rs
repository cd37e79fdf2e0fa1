use async_trait::async_trait;

use super::JobStore;
use crate::db::Database;
use crate::errors::GeoError;
use crate::models::{AnalysisJob, JobEvent, JobPatch, JobSummary};

#[derive(Clone)]
pub struct SqliteJobStore {
    db: Database,
}

impl SqliteJobStore {
    pub fn open(path: &str) -> Result<Self, GeoError> {
        Ok(Self { db: Database::new(path)? })
    }

    pub fn in_memory() -> Result<Self, GeoError> {
        Ok(Self { db: Database::in_memory()? })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn get(&self, id: &str) -> Result<Option<AnalysisJob>, GeoError> {
        self.db.get_job(id)
    }

    async fn create(&self, job: &AnalysisJob) -> Result<(), GeoError> {
        self.db.create_job(job)
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<AnalysisJob, GeoError> {
        self.db.update_job(id, patch)
    }

    async fn append_event(&self, id: &str, event: JobEvent) -> Result<(), GeoError> {
        self.db.append_job_event(id, &event)
    }

    async fn events(&self, id: &str) -> Result<Vec<JobEvent>, GeoError> {
        self.db.job_events(id)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<JobSummary>, GeoError> {
        self.db.list_jobs(limit, offset)
    }
}
