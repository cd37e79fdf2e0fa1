use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::errors::GeoError;
use crate::fetch::url::normalize_url;
use crate::models::{AnalysisJob, JobStatus};

const MAX_PAGE: usize = 100;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

async fn load(state: &AppState, id: &str) -> Result<AnalysisJob, GeoError> {
    state
        .services
        .store
        .get(id)
        .await?
        .ok_or_else(|| GeoError::NotFound(format!("job {id} not found")))
}

/// `POST /api/analyze {url, userId?}`
pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), GeoError> {
    let raw = body
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| GeoError::Validation("url is required and must be a string".into()))?;
    let url = normalize_url(raw)?;
    let user_id = body.get("userId").and_then(Value::as_str).map(str::to_string);

    let job = AnalysisJob::new(uuid::Uuid::new_v4().to_string(), url, user_id);
    state.services.store.create(&job).await?;
    let token = state.claim(&job.id)?;
    state.dispatch(job.id.clone(), token);
    info!(job_id = %job.id, url = %job.url, "Job queued");

    Ok((StatusCode::ACCEPTED, Json(json!({ "jobId": job.id }))))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, GeoError> {
    let limit = query.limit.unwrap_or(20).min(MAX_PAGE);
    let offset = query.offset.unwrap_or(0);

    let jobs = state.services.store.list(limit, offset).await?;
    Ok(Json(json!({ "jobs": jobs, "total": jobs.len() })))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisJob>, GeoError> {
    Ok(Json(load(&state, &id).await?))
}

/// Status for polling clients. Unknown ids read as not yet queued-visible.
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), GeoError> {
    let Some(job) = state.services.store.get(&id).await? else {
        return Ok((StatusCode::ACCEPTED, Json(json!({ "status": JobStatus::Queued }))));
    };

    let body = match job.status {
        JobStatus::Completed => json!({ "status": job.status, "job": job }),
        status => match &job.error {
            Some(error) => json!({ "status": status, "error": error }),
            None => json!({ "status": status }),
        },
    };
    Ok((StatusCode::OK, Json(body)))
}

pub async fn get_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, GeoError> {
    load(&state, &id).await?;
    let events = state.services.store.events(&id).await?;
    Ok(Json(json!({ "jobId": id, "events": events })))
}

pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), GeoError> {
    if let Some(token) = state.active_jobs.get(&id) {
        token.cancel();
        info!(job_id = %id, "Cancellation requested");
        return Ok((StatusCode::ACCEPTED, Json(json!({ "jobId": id, "cancelled": true }))));
    }

    let job = load(&state, &id).await?;
    Err(GeoError::Conflict(format!("job {} is not running ({})", id, job.status)))
}
