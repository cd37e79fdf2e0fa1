use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::Database;
use crate::errors::GeoError;
use crate::models::{AnalysisJob, EventStatus, JobEvent, JobPatch, JobStatus, JobSummary};

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> GeoError + '_ {
    move |e| GeoError::Database(format!("{context}: {e}"))
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, GeoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| GeoError::Database(format!("Bad timestamp '{raw}': {e}")))
}

fn parse_status(raw: &str) -> Result<JobStatus, GeoError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| GeoError::Database(format!("Bad status '{raw}': {e}")))
}

fn parse_event_status(raw: &str) -> Result<EventStatus, GeoError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| GeoError::Database(format!("Bad event status '{raw}': {e}")))
}

/// Serialize the job without its event log, which lives in `job_events`.
fn document(job: &AnalysisJob) -> Result<String, GeoError> {
    let mut doc = serde_json::to_value(job)?;
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("events");
    }
    Ok(serde_json::to_string(&doc)?)
}

fn load_document(conn: &Connection, id: &str) -> Result<Option<AnalysisJob>, GeoError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT document FROM jobs WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err("Query failed"))?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn load_events(conn: &Connection, id: &str) -> Result<Vec<JobEvent>, GeoError> {
    let mut stmt = conn
        .prepare("SELECT step, status, detail, timestamp FROM job_events WHERE job_id = ?1 ORDER BY seq ASC")
        .map_err(db_err("Query failed"))?;

    let rows = stmt
        .query_map(rusqlite::params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(db_err("Query error"))?;

    let mut events = Vec::new();
    for row in rows {
        let (step, status, detail, timestamp) = row.map_err(db_err("Row error"))?;
        events.push(JobEvent {
            step,
            status: parse_event_status(&status)?,
            timestamp: parse_ts(&timestamp)?,
            detail: detail.map(|d| serde_json::from_str(&d)).transpose()?,
        });
    }
    Ok(events)
}

impl Database {
    pub fn create_job(&self, job: &AnalysisJob) -> Result<(), GeoError> {
        let doc = document(job)?;
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO jobs (id, url, user_id, status, final_score, document, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                job.id,
                job.url,
                job.user_id,
                job.status.as_str(),
                job.final_score,
                doc,
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(GeoError::Conflict(format!("job {} already exists", job.id)))
            }
            Err(e) => Err(GeoError::Database(format!("Failed to create job: {e}"))),
        }
    }

    pub fn get_job(&self, id: &str) -> Result<Option<AnalysisJob>, GeoError> {
        let conn = self.lock()?;
        let Some(mut job) = load_document(&conn, id)? else {
            return Ok(None);
        };
        job.events = load_events(&conn, id)?;
        Ok(Some(job))
    }

    /// Read-modify-write of one job document under the connection lock.
    pub fn update_job(&self, id: &str, patch: JobPatch) -> Result<AnalysisJob, GeoError> {
        let conn = self.lock()?;
        let mut job = load_document(&conn, id)?
            .ok_or_else(|| GeoError::NotFound(format!("job {id}")))?;
        job.apply(patch)?;

        conn.execute(
            "UPDATE jobs SET status = ?2, final_score = ?3, document = ?4, updated_at = ?5 WHERE id = ?1",
            rusqlite::params![
                id,
                job.status.as_str(),
                job.final_score,
                document(&job)?,
                job.updated_at.to_rfc3339(),
            ],
        )
        .map_err(db_err("Update failed"))?;

        job.events = load_events(&conn, id)?;
        Ok(job)
    }

    pub fn append_job_event(&self, id: &str, event: &JobEvent) -> Result<(), GeoError> {
        let detail = event.detail.as_ref().map(serde_json::to_string).transpose()?;
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO job_events (job_id, step, status, detail, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                id,
                event.step,
                event.status.as_str(),
                detail,
                event.timestamp.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(GeoError::NotFound(format!("job {id}")))
            }
            Err(e) => Err(GeoError::Database(format!("Failed to append event: {e}"))),
        }
    }

    pub fn job_events(&self, id: &str) -> Result<Vec<JobEvent>, GeoError> {
        let conn = self.lock()?;
        load_events(&conn, id)
    }

    pub fn list_jobs(&self, limit: usize, offset: usize) -> Result<Vec<JobSummary>, GeoError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, url, status, final_score, created_at, updated_at FROM jobs ORDER BY created_at DESC LIMIT ?1 OFFSET ?2")
            .map_err(db_err("Query failed"))?;

        let rows = stmt
            .query_map(rusqlite::params![limit as i64, offset as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<u32>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(db_err("Query error"))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, url, status, final_score, created_at, updated_at) = row.map_err(db_err("Row error"))?;
            results.push(JobSummary {
                id,
                url,
                status: parse_status(&status)?,
                final_score,
                created_at: parse_ts(&created_at)?,
                updated_at: parse_ts(&updated_at)?,
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str) -> AnalysisJob {
        AnalysisJob::new(id, "https://example.com", Some("user-1".into()))
    }

    #[test]
    fn test_create_and_get_job() {
        let db = Database::in_memory().unwrap();
        db.create_job(&job("j1")).unwrap();

        let loaded = db.get_job("j1").unwrap().unwrap();
        assert_eq!(loaded.url, "https://example.com");
        assert_eq!(loaded.status, JobStatus::Queued);
        assert!(loaded.events.is_empty());
    }

    #[test]
    fn test_get_missing_job() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_job("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_conflicts() {
        let db = Database::in_memory().unwrap();
        db.create_job(&job("j1")).unwrap();
        let err = db.create_job(&job("j1")).unwrap_err();
        assert!(matches!(err, GeoError::Conflict(_)));
    }

    #[test]
    fn test_update_merges_fields() {
        let db = Database::in_memory().unwrap();
        db.create_job(&job("j1")).unwrap();

        db.update_job("j1", JobPatch::status(JobStatus::Processing)).unwrap();
        let updated = db
            .update_job("j1", JobPatch { scraped_content: Some("body".into()), ..Default::default() })
            .unwrap();

        assert_eq!(updated.status, JobStatus::Processing);
        assert_eq!(updated.scraped_content.as_deref(), Some("body"));
        assert_eq!(updated.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_update_missing_job_not_found() {
        let db = Database::in_memory().unwrap();
        let err = db.update_job("ghost", JobPatch::status(JobStatus::Processing)).unwrap_err();
        assert!(matches!(err, GeoError::NotFound(_)));
    }

    #[test]
    fn test_events_keep_append_order() {
        let db = Database::in_memory().unwrap();
        db.create_job(&job("j1")).unwrap();
        db.append_job_event("j1", &JobEvent::new("INIT", EventStatus::Started)).unwrap();
        db.append_job_event(
            "j1",
            &JobEvent::new("INIT", EventStatus::Completed).with_detail(serde_json::json!({"ok": true})),
        )
        .unwrap();
        db.append_job_event("j1", &JobEvent::new("FETCH", EventStatus::Started)).unwrap();

        let events = db.job_events("j1").unwrap();
        let steps: Vec<_> = events.iter().map(|e| (e.step.as_str(), e.status)).collect();
        assert_eq!(
            steps,
            vec![
                ("INIT", EventStatus::Started),
                ("INIT", EventStatus::Completed),
                ("FETCH", EventStatus::Started),
            ]
        );
        assert_eq!(events[1].detail, Some(serde_json::json!({"ok": true})));
    }

    #[test]
    fn test_event_for_unknown_job_rejected() {
        let db = Database::in_memory().unwrap();
        let err = db
            .append_job_event("ghost", &JobEvent::new("INIT", EventStatus::Started))
            .unwrap_err();
        assert!(matches!(err, GeoError::NotFound(_)));
    }

    #[test]
    fn test_list_jobs() {
        let db = Database::in_memory().unwrap();
        db.create_job(&job("a")).unwrap();
        db.create_job(&job("b")).unwrap();
        let listed = db.list_jobs(10, 0).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(db.list_jobs(1, 0).unwrap().len(), 1);
    }
}
