use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::JobStore;
use crate::errors::GeoError;
use crate::models::{AnalysisJob, JobEvent, JobPatch, JobSummary};

/// Process-local store. Each job is mutated under its map-entry lock.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: DashMap<String, AnalysisJob>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: &str) -> Result<Option<AnalysisJob>, GeoError> {
        Ok(self.jobs.get(id).map(|j| j.value().clone()))
    }

    async fn create(&self, job: &AnalysisJob) -> Result<(), GeoError> {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(_) => Err(GeoError::Conflict(format!("job {} already exists", job.id))),
            Entry::Vacant(slot) => {
                slot.insert(job.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<AnalysisJob, GeoError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| GeoError::NotFound(format!("job {id}")))?;
        let mut next = entry.value().clone();
        next.apply(patch)?;
        *entry.value_mut() = next.clone();
        Ok(next)
    }

    async fn append_event(&self, id: &str, event: JobEvent) -> Result<(), GeoError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| GeoError::NotFound(format!("job {id}")))?;
        entry.value_mut().events.push(event);
        Ok(())
    }

    async fn events(&self, id: &str) -> Result<Vec<JobEvent>, GeoError> {
        Ok(self
            .jobs
            .get(id)
            .map(|j| j.value().events.clone())
            .unwrap_or_default())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<JobSummary>, GeoError> {
        let mut all: Vec<JobSummary> = self.jobs.iter().map(|j| JobSummary::from(j.value())).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventStatus, JobStatus};

    #[tokio::test]
    async fn test_create_conflict() {
        let store = MemoryJobStore::new();
        let job = AnalysisJob::new("j1", "https://example.com", None);
        store.create(&job).await.unwrap();
        assert!(matches!(store.create(&job).await, Err(GeoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_leaves_unmentioned_fields() {
        let store = MemoryJobStore::new();
        store
            .create(&AnalysisJob::new("j1", "https://example.com", Some("u".into())))
            .await
            .unwrap();
        store
            .update("j1", JobPatch { scraped_content: Some("text".into()), ..Default::default() })
            .await
            .unwrap();
        let job = store.update("j1", JobPatch::status(JobStatus::Processing)).await.unwrap();
        assert_eq!(job.scraped_content.as_deref(), Some("text"));
        assert_eq!(job.user_id.as_deref(), Some("u"));
        assert_eq!(job.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_rejected_update_keeps_stored_job() {
        let store = MemoryJobStore::new();
        store.create(&AnalysisJob::new("j1", "https://example.com", None)).await.unwrap();
        store.update("j1", JobPatch::failed("boom")).await.unwrap();
        assert!(store.update("j1", JobPatch::status(JobStatus::Completed)).await.is_err());
        let job = store.get("j1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_append_event_unknown_job() {
        let store = MemoryJobStore::new();
        let result = store.append_event("ghost", JobEvent::new("INIT", EventStatus::Started)).await;
        assert!(matches!(result, Err(GeoError::NotFound(_))));
    }
}
