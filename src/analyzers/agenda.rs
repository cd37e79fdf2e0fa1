use tracing::{info, warn};

use super::ai::AnalysisService;
use super::StageOutput;
use crate::errors::GeoError;
use crate::models::{AnalysisJob, StrategicAgenda};

pub async fn run_agenda(job: &AnalysisJob, ai: &dyn AnalysisService) -> Result<StageOutput<StrategicAgenda>, GeoError> {
    let evaluation = job
        .scored_evaluation
        .as_ref()
        .ok_or_else(|| GeoError::Validation("scored evaluation is required for the strategic agenda".into()))?;

    info!(job_id = %job.id, "Building strategic agenda");
    let (agenda, warnings) = ai.agenda(&job.url, evaluation).await.into_result("agenda")?;
    for w in &warnings {
        warn!(job_id = %job.id, warning = %w, "Agenda generation degraded");
    }
    Ok(StageOutput::new(agenda, warnings))
}
