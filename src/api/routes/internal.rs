use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::AppState;
use crate::errors::GeoError;
use crate::fetch::url::normalize_url;
use crate::models::{AnalysisJob, JobPatch, JobStatus};

fn required<'a>(body: &'a Value, field: &str) -> Result<&'a str, GeoError> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GeoError::Validation(format!("{field} is required")))
}

/// `POST /api/internal/start-analysis {jobId, userId, domain}`
///
/// Marks the job `PROCESSING` before returning and runs it in the background.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), GeoError> {
    let job_id = required(&body, "jobId")?;
    let user_id = required(&body, "userId")?;
    let url = normalize_url(required(&body, "domain")?)?;

    let store = &state.services.store;
    let existing = store.get(job_id).await?;
    if let Some(job) = &existing {
        if job.status.is_terminal() {
            return Err(GeoError::Conflict(format!("job {job_id} is already {}", job.status)));
        }
    }

    let token = state.claim(job_id)?;
    let prepared = async {
        if existing.is_none() {
            store
                .create(&AnalysisJob::new(job_id, url.as_str(), Some(user_id.to_string())))
                .await?;
        }
        store.update(job_id, JobPatch::status(JobStatus::Processing)).await
    };
    if let Err(e) = prepared.await {
        warn!(job_id, error = %e, "Could not prepare job for dispatch");
        state.release(job_id);
        return Err(e);
    }

    state.dispatch(job_id.to_string(), token);
    info!(job_id, url = %url, "Internal analysis dispatched");

    Ok((StatusCode::ACCEPTED, Json(json!({ "ok": true, "queued": true }))))
}
