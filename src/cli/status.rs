use crate::cli::commands::StatusArgs;
use crate::errors::GeoError;
use tracing::info;

pub async fn handle_status(args: StatusArgs) -> Result<(), GeoError> {
    info!(job_id = %args.job_id, "Querying job status");

    let client = reqwest::Client::new();
    let url = format!(
        "{}/api/jobs/{}/status",
        args.server.trim_end_matches('/'),
        args.job_id
    );

    loop {
        let resp = client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeoError::Network(format!("Failed to query job: {}", e)))?;

        let status: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GeoError::Network(format!("Invalid response: {}", e)))?;

        let job_status = status["status"].as_str().unwrap_or("UNKNOWN");
        if args.json {
            println!("{}", serde_json::to_string(&status)?);
        } else {
            println!("Status: {}", job_status);
            if let Some(error) = status["error"].as_str() {
                println!("Error: {}", error);
            }
            if let Some(score) = status["job"]["finalScore"].as_u64() {
                println!("Score: {}/100", score);
            }
        }

        if !args.follow || job_status == "COMPLETED" || job_status == "FAILED" {
            break;
        }

        tokio::time::sleep(std::time::Duration::from_secs(args.interval.max(1))).await;
    }

    Ok(())
}
