pub mod auth;
pub mod errors;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{middleware, Router};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::app::Services;
use crate::errors::GeoError;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub internal_token: Option<String>,
    /// Jobs with a live orchestration in this process.
    pub active_jobs: Arc<DashMap<String, CancellationToken>>,
    tasks: TaskTracker,
}

impl AppState {
    pub fn new(services: Services, internal_token: Option<String>) -> Self {
        Self {
            services,
            internal_token,
            active_jobs: Arc::new(DashMap::new()),
            tasks: TaskTracker::new(),
        }
    }

    /// Reserve a live-run slot for `job_id`.
    ///
    /// Fails with [`GeoError::Conflict`] while another run holds the slot.
    pub fn claim(&self, job_id: &str) -> Result<CancellationToken, GeoError> {
        match self.active_jobs.entry(job_id.to_string()) {
            Entry::Occupied(_) => Err(GeoError::Conflict(format!("job {job_id} is already running"))),
            Entry::Vacant(slot) => {
                let token = CancellationToken::new();
                slot.insert(token.clone());
                Ok(token)
            }
        }
    }

    pub fn release(&self, job_id: &str) {
        self.active_jobs.remove(job_id);
    }

    /// Run the job in the background; the slot is released when it finishes.
    pub fn dispatch(&self, job_id: String, token: CancellationToken) -> JoinHandle<()> {
        let orchestrator = self.services.orchestrator().with_cancel_token(token);
        let active = Arc::clone(&self.active_jobs);
        self.tasks.spawn(async move {
            match orchestrator.run(&job_id).await {
                Ok(job) => info!(job_id = %job_id, status = %job.status, "Analysis finished"),
                Err(e) => error!(job_id = %job_id, error = %e, "Analysis failed"),
            }
            active.remove(&job_id);
        })
    }

    /// Signal every live run to stop.
    pub fn cancel_all(&self) {
        for entry in self.active_jobs.iter() {
            entry.value().cancel();
        }
    }

    /// Cancel live runs and wait up to `grace` for them to record their
    /// outcome. Returns false if some run was still going when time ran out.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        info!(active_jobs = self.active_jobs.len(), "Cancelling live jobs");
        self.cancel_all();
        self.tasks.close();
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            warn!(remaining = self.tasks.len(), "Live jobs did not stop in time");
            return false;
        }
        true
    }
}

pub fn build_router(state: AppState) -> Router {
    let internal = Router::new()
        .route("/api/internal/start-analysis", post(routes::internal::start_analysis))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::internal_token_middleware,
        ));

    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/analyze", post(routes::jobs::analyze))
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/:id", get(routes::jobs::get_job))
        .route("/api/jobs/:id/status", get(routes::jobs::get_status))
        .route("/api/jobs/:id/events", get(routes::jobs::get_events))
        .route("/api/jobs/:id/cancel", post(routes::jobs::cancel_job))
        .merge(internal)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
