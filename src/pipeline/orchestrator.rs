use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::stage::{display_name, StageName};
use crate::analyzers::{
    run_agenda, run_generative, run_market, run_narrative, run_scoring, AnalysisService, PerformanceProbe,
    StageOutput,
};
use crate::errors::GeoError;
use crate::fetch::ContentFetcher;
use crate::models::{AnalysisJob, EventStatus, JobEvent, JobPatch, JobStatus};
use crate::store::JobStore;

const CANCELLED: &str = "cancelled";

/// An error raised while `stage` was running.
struct StageFailure {
    stage: StageName,
    error: GeoError,
}

trait AtStage<T> {
    fn at(self, stage: StageName) -> Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T, GeoError> {
    fn at(self, stage: StageName) -> Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

fn warnings_detail<T>(output: &StageOutput<T>) -> Option<Value> {
    if output.warnings.is_empty() {
        None
    } else {
        Some(json!({ "warnings": output.warnings }))
    }
}

/// Drives one job through every stage, persisting after each transition.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    store: Arc<dyn JobStore>,
    fetcher: Arc<dyn ContentFetcher>,
    performance: Arc<dyn PerformanceProbe>,
    ai: Arc<dyn AnalysisService>,
    seed_queries: Vec<String>,
    cancel_token: CancellationToken,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        fetcher: Arc<dyn ContentFetcher>,
        performance: Arc<dyn PerformanceProbe>,
        ai: Arc<dyn AnalysisService>,
        seed_queries: Vec<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            performance,
            ai,
            seed_queries,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Replace the cancel token so an external holder can stop this run.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Run the full pipeline for `job_id`.
    ///
    /// A failed fetch ends the job cleanly and returns it. A failure in a later
    /// stage is persisted on the job and returned as [`GeoError::Orchestration`].
    pub async fn run(&self, job_id: &str) -> Result<AnalysisJob, GeoError> {
        let job = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| GeoError::NotFound(format!("job {}", job_id)))?;
        if job.status.is_terminal() {
            return Err(GeoError::Conflict(format!("job {} is already {}", job_id, job.status)));
        }

        info!(job_id, url = %job.url, "Analysis started");

        match self.drive(job).await {
            Ok(job) => Ok(job),
            Err(StageFailure { stage, error }) => Err(self.fail(job_id, stage, error).await),
        }
    }

    async fn drive(&self, job: AnalysisJob) -> Result<AnalysisJob, StageFailure> {
        let id = job.id.clone();

        // 1. init
        self.enter(&id, StageName::Init).await?;
        self.complete(&id, StageName::Init, JobPatch::default(), None).await?;

        // 2. fetch
        let job = self.enter(&id, StageName::Fetch).await?;
        let page = match self.interruptible(StageName::Fetch, self.fetcher.fetch(&job.url)).await? {
            Ok(page) => page,
            Err(e) => return self.fail_fetch(&id, e).await,
        };
        let via = page.via;
        let meta = page.meta();
        let patch = JobPatch {
            scraped_html: Some(page.html),
            scraped_content: Some(page.content),
            scrape_meta: Some(meta),
            ..Default::default()
        };
        self.complete(&id, StageName::Fetch, patch, Some(json!({ "via": via })))
            .await?;

        // 3. performance
        let job = self.enter(&id, StageName::Performance).await?;
        let report = self
            .interruptible(StageName::Performance, self.performance.analyze(&job.url))
            .await?
            .at(StageName::Performance)?;
        let patch = JobPatch {
            performance_report: Some(report),
            ..Default::default()
        };
        self.complete(&id, StageName::Performance, patch, None).await?;

        // 4. market
        let job = self.enter(&id, StageName::Market).await?;
        let market = self
            .interruptible(StageName::Market, run_market(&job, self.ai.as_ref()))
            .await?
            .at(StageName::Market)?;
        let detail = warnings_detail(&market);
        let patch = JobPatch {
            business_analysis: Some(market.value),
            ..Default::default()
        };
        self.complete(&id, StageName::Market, patch, detail).await?;

        // 5. scoring
        let job = self.enter(&id, StageName::Scoring).await?;
        let scored = self
            .interruptible(StageName::Scoring, run_scoring(&job, self.ai.as_ref()))
            .await?
            .at(StageName::Scoring)?;
        let detail = warnings_detail(&scored);
        let final_score = scored.value.overall_score.min(100);
        let patch = JobPatch {
            scored_evaluation: Some(scored.value),
            ..Default::default()
        };
        self.complete(&id, StageName::Scoring, patch, detail).await?;

        // 6. agenda
        let job = self.enter(&id, StageName::Agenda).await?;
        let agenda = self
            .interruptible(StageName::Agenda, run_agenda(&job, self.ai.as_ref()))
            .await?
            .at(StageName::Agenda)?;
        let detail = warnings_detail(&agenda);
        let patch = JobPatch {
            strategic_agenda: Some(agenda.value),
            ..Default::default()
        };
        self.complete(&id, StageName::Agenda, patch, detail).await?;

        // 7. generative
        let job = self.enter(&id, StageName::Generative).await?;
        let brand = job
            .business_analysis
            .as_ref()
            .and_then(|m| m.business_model.brand_name.clone())
            .filter(|b| !b.trim().is_empty())
            .or_else(|| job.hostname())
            .unwrap_or_else(|| job.url.clone());
        let generative = self
            .interruptible(
                StageName::Generative,
                run_generative(&job, &brand, &self.seed_queries, self.ai.as_ref()),
            )
            .await?
            .at(StageName::Generative)?;
        let detail = warnings_detail(&generative);
        let patch = JobPatch {
            generative_performance_report: Some(generative.value),
            ..Default::default()
        };
        let job = self.complete(&id, StageName::Generative, patch, detail).await?;

        // 8. enhanced narrative, best-effort
        self.record(&id, JobEvent::new(StageName::Enhanced.step(), EventStatus::Started))
            .await;
        match self.interruptible(StageName::Enhanced, run_narrative(&job, self.ai.as_ref())).await? {
            Some(narrative) => {
                let patch = JobPatch {
                    enhanced_analysis: Some(narrative),
                    ..Default::default()
                };
                match self.store.update(&id, patch).await {
                    Ok(_) => {
                        self.record(&id, JobEvent::new(StageName::Enhanced.step(), EventStatus::Completed))
                            .await
                    }
                    Err(e) => warn!(job_id = %id, error = %e, "Failed to persist enhanced narrative"),
                }
            }
            None => {
                self.record(
                    &id,
                    JobEvent::new(StageName::Enhanced.step(), EventStatus::Failed)
                        .with_detail(json!({ "reason": "enhanced narrative unavailable" })),
                )
                .await
            }
        }

        // 9. done
        let patch = JobPatch {
            status: Some(JobStatus::Completed),
            final_score: Some(final_score),
            ..Default::default()
        };
        let job = self.store.update(&id, patch).await.at(StageName::Enhanced)?;
        info!(job_id = %id, final_score, "Analysis completed");
        Ok(job)
    }

    /// Await a stage's external work, giving up as soon as the run is cancelled.
    async fn interruptible<T>(
        &self,
        stage: StageName,
        work: impl Future<Output = T>,
    ) -> Result<T, StageFailure> {
        tokio::select! {
            out = work => Ok(out),
            _ = self.cancel_token.cancelled() => {
                info!(stage = %stage, "Analysis cancelled mid-stage");
                Err(StageFailure { stage, error: GeoError::Cancelled(CANCELLED.into()) })
            }
        }
    }

    /// Persist the stage status and append its STARTED event.
    async fn enter(&self, id: &str, stage: StageName) -> Result<AnalysisJob, StageFailure> {
        if self.cancel_token.is_cancelled() {
            info!(job_id = id, stage = %stage, "Analysis cancelled");
            return Err(StageFailure { stage, error: GeoError::Cancelled(CANCELLED.into()) });
        }

        let patch = stage.status().map(JobPatch::status).unwrap_or_default();
        let job = self.store.update(id, patch).await.at(stage)?;
        info!(job_id = id, stage = display_name(stage), "Stage started");
        self.record(id, JobEvent::new(stage.step(), EventStatus::Started)).await;
        Ok(job)
    }

    /// Persist the stage output and append its COMPLETED event.
    async fn complete(
        &self,
        id: &str,
        stage: StageName,
        patch: JobPatch,
        detail: Option<Value>,
    ) -> Result<AnalysisJob, StageFailure> {
        let job = self.store.update(id, patch).await.at(stage)?;
        let mut event = JobEvent::new(stage.step(), EventStatus::Completed);
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.record(id, event).await;
        Ok(job)
    }

    /// Append an event. Failures are logged and never abort the run.
    async fn record(&self, id: &str, event: JobEvent) {
        let step = event.step.clone();
        if let Err(e) = self.store.append_event(id, event).await {
            warn!(job_id = id, step = %step, error = %e, "Failed to append job event");
        }
    }

    async fn fail_fetch(&self, id: &str, e: GeoError) -> Result<AnalysisJob, StageFailure> {
        let reason = e.user_message();
        warn!(job_id = id, error = %e, "Fetch failed, ending job");
        let job = self
            .store
            .update(id, JobPatch::failed(format!("fetch_failed: {}", reason)))
            .await
            .at(StageName::Fetch)?;
        self.record(
            id,
            JobEvent::new(StageName::Fetch.step(), EventStatus::Failed)
                .with_detail(json!({ "reason": reason, "errorType": e.classify().error_type })),
        )
        .await;
        Ok(job)
    }

    /// Record a stage failure on the job and build the error for the caller.
    async fn fail(&self, id: &str, stage: StageName, e: GeoError) -> GeoError {
        let classification = e.classify();
        let message = match &e {
            GeoError::Cancelled(_) => CANCELLED.to_string(),
            other => other.user_message(),
        };
        error!(
            job_id = id,
            stage = %stage,
            error_type = classification.error_type,
            error = %e,
            "Stage failed"
        );

        if let Err(persist) = self.store.update(id, JobPatch::failed(message.clone())).await {
            error!(job_id = id, error = %persist, "Failed to persist job failure");
        }
        self.record(
            id,
            JobEvent::new(stage.step(), EventStatus::Failed).with_detail(json!({
                "reason": message,
                "errorType": classification.error_type,
            })),
        )
        .await;

        GeoError::Orchestration {
            job_id: id.to_string(),
            error_type: classification.error_type,
            message,
        }
    }
}
