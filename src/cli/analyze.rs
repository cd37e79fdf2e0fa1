use tracing::info;

use crate::app::Services;
use crate::cli::commands::AnalyzeArgs;
use crate::cli::load_config;
use crate::errors::GeoError;
use crate::fetch::url::normalize_url;
use crate::models::{AnalysisJob, JobStatus};

pub async fn handle_analyze(args: AnalyzeArgs) -> Result<(), GeoError> {
    let url = normalize_url(&args.url)?;
    let config = load_config(args.config.as_deref(), args.db.as_deref()).await?;
    let services = Services::from_config(&config)?;

    let job = AnalysisJob::new(uuid::Uuid::new_v4().to_string(), url, None);
    services.store.create(&job).await?;
    info!(job_id = %job.id, url = %job.url, "Running analysis inline");

    let job = services.orchestrator().run(&job.id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_summary(&job);
    }

    if job.status == JobStatus::Failed {
        return Err(GeoError::Orchestration {
            job_id: job.id.clone(),
            error_type: "ScrapingError",
            message: job.error.clone().unwrap_or_default(),
        });
    }
    Ok(())
}

fn print_summary(job: &AnalysisJob) {
    println!("Job:     {}", job.id);
    println!("URL:     {}", job.url);
    println!("Status:  {}", job.status);
    if let Some(error) = &job.error {
        println!("Error:   {}", error);
    }
    if let Some(score) = job.final_score {
        println!("Score:   {}/100", score);
    }
    if let Some(eval) = &job.scored_evaluation {
        for (name, pillar) in &eval.pillars {
            println!("  {:<20} {:>3}", name, pillar.score);
        }
    }
    if let Some(report) = &job.generative_performance_report {
        println!(
            "Share of voice: {:.0}%  Citation rate: {:.0}%  Accuracy: {}%",
            report.share_of_generative_voice.score,
            report.citation_analysis.citation_rate,
            report.accuracy_and_hallucination.accuracy_score
        );
    }
}
