use serde_json::Value;
use tracing::{debug, warn};

use super::ai::AnalysisService;
use crate::models::AnalysisJob;

/// Best-effort executive narrative. Never fails the job; `None` on any error.
pub async fn run_narrative(job: &AnalysisJob, ai: &dyn AnalysisService) -> Option<Value> {
    match ai.enhanced_narrative(job).await.into_result("enhanced_narrative") {
        Ok((value, warnings)) => {
            if !warnings.is_empty() {
                debug!(job_id = %job.id, warnings = warnings.len(), "Narrative produced by fallback provider");
            }
            Some(value)
        }
        Err(e) => {
            warn!(job_id = %job.id, error = %e, "Enhanced narrative failed, continuing without it");
            None
        }
    }
}
