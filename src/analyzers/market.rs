use tracing::{info, warn};

use super::ai::AnalysisService;
use super::StageOutput;
use crate::errors::GeoError;
use crate::llm::ProviderOutcome;
use crate::models::{AnalysisJob, MarketReport};

const MIN_CONTENT_CHARS: usize = 100;

/// Business model, audience and competitors, analyzed concurrently.
///
/// Any sub-analysis where every provider failed fails the stage. Degraded
/// answers are accepted and their warnings returned.
pub async fn run_market(job: &AnalysisJob, ai: &dyn AnalysisService) -> Result<StageOutput<MarketReport>, GeoError> {
    let content = job
        .scraped_content
        .as_deref()
        .filter(|c| c.trim().chars().count() >= MIN_CONTENT_CHARS)
        .ok_or_else(|| GeoError::Validation("scraped content is insufficient for market analysis".into()))?;

    info!(job_id = %job.id, "Running market analysis");

    let (business, audience, competitors) = tokio::join!(
        ai.business_model(&job.url, content),
        ai.target_audience(&job.url, content),
        ai.competitors(&job.url, content),
    );

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let business_model = collect(business, "business_model", &mut errors, &mut warnings);
    let target_audience = collect(audience, "target_audience", &mut errors, &mut warnings);
    let competitors = collect(competitors, "competitors", &mut errors, &mut warnings);

    match (business_model, target_audience, competitors) {
        (Some(business_model), Some(target_audience), Some(competitors)) if errors.is_empty() => {
            for w in &warnings {
                warn!(job_id = %job.id, warning = %w, "Market analysis degraded");
            }
            Ok(StageOutput::new(
                MarketReport { business_model, target_audience, competitors },
                warnings,
            ))
        }
        _ => Err(GeoError::Analysis(format!(
            "market analysis encountered AI errors: {}",
            errors.join(", ")
        ))),
    }
}

fn collect<T>(
    outcome: ProviderOutcome<T>,
    operation: &str,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> Option<T> {
    match outcome {
        ProviderOutcome::Ok { data, .. } => Some(data),
        ProviderOutcome::Degraded { data, provider, warnings: w } => {
            warnings.extend(w.into_iter().map(|msg| format!("{operation} ({provider}): {msg}")));
            Some(data)
        }
        ProviderOutcome::AllFailed { errors: e } => {
            errors.push(format!("{operation}: {}", e.join("; ")));
            None
        }
    }
}
