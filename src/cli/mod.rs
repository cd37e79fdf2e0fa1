pub mod analyze;
pub mod commands;
pub mod events;
pub mod serve;
pub mod status;

use std::path::Path;

pub use commands::{Cli, Commands, LogFormat};

use crate::config::credentials::mask_secret;
use crate::config::{self, AppConfig, StoreConfig};
use crate::errors::GeoError;

/// Load config for a command, applying its `--db` override.
pub async fn load_config(path: Option<&str>, db: Option<&str>) -> Result<AppConfig, GeoError> {
    let mut config = config::load(path.map(Path::new)).await?;
    if let Some(db) = db {
        config.store = StoreConfig::Sqlite { path: db.to_string() };
    }
    Ok(config)
}

pub async fn handle_validate(args: commands::ValidateArgs) -> Result<(), GeoError> {
    let raw = config::parse_config(Path::new(&args.config)).await?;
    let resolved = AppConfig::resolve(&raw);
    println!("Configuration is valid: {}", args.config);
    println!("  AI providers: {}", resolved.llm.providers.len());
    for p in &resolved.llm.providers {
        println!("    {} ({}) key {}", p.provider, p.model, mask_secret(&p.api_key));
    }
    println!(
        "  PageSpeed key: {}",
        resolved.pagespeed.api_key.as_deref().map(mask_secret).unwrap_or_else(|| "(none)".into())
    );
    println!(
        "  Remote scraper: {}",
        resolved.fetch.scraper_url.as_deref().unwrap_or("(none)")
    );
    Ok(())
}

/// Process exit code for a failed command.
pub fn exit_code(e: &GeoError) -> i32 {
    let error_type = match e {
        GeoError::Orchestration { error_type, .. } => *error_type,
        other => other.classify().error_type,
    };
    match error_type {
        "ConfigurationError" => 2,
        "ValidationError" => 3,
        "ScrapingError" | "DnsResolutionError" => 4,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&GeoError::Config("x".into())), 2);
        assert_eq!(exit_code(&GeoError::Validation("x".into())), 3);
        assert_eq!(exit_code(&GeoError::DnsResolution("x".into())), 4);
        assert_eq!(exit_code(&GeoError::Internal("x".into())), 1);
        let wrapped = GeoError::Orchestration {
            job_id: "j".into(),
            error_type: "ConfigurationError",
            message: "no key".into(),
        };
        assert_eq!(exit_code(&wrapped), 2);
    }
}
