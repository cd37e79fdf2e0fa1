use std::path::Path;
use crate::errors::GeoError;
use super::types::GeoConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub async fn parse_config(path: &Path) -> Result<GeoConfig, GeoError> {
    if !path.exists() {
        return Err(GeoError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(GeoError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<GeoConfig, GeoError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(GeoConfig::default());
    }

    validate_schema(&yaml)?;

    let config: GeoConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), GeoError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| GeoError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| GeoError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        let messages: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        if !messages.is_empty() {
            return Err(GeoError::Config(format!(
                "Invalid configuration: {}",
                messages.join("; ")
            )));
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &GeoConfig) -> Result<(), GeoError> {
    if let Some(fetch) = &config.fetch {
        if fetch.remote_only == Some(true) && fetch.scraper_url.is_none() {
            warn!("fetch.remote_only is set without fetch.scraper_url; SCRAPER_URL must be provided");
        }
        if fetch.local_attempts == Some(0) {
            return Err(GeoError::Config("fetch.local_attempts must be at least 1".into()));
        }
    }

    if let Some(providers) = config.llm.as_ref().and_then(|l| l.providers.as_ref()) {
        for (i, p) in providers.iter().enumerate() {
            if providers[..i].iter().any(|q| q.provider == p.provider) {
                return Err(GeoError::Config(format!(
                    "LLM provider '{}' is listed more than once",
                    p.provider
                )));
            }
        }
    }

    if let Some(queries) = config.analysis.as_ref().and_then(|a| a.seed_queries.as_ref()) {
        if queries.iter().any(|q| !q.contains("{brand}")) {
            warn!("Some analysis.seed_queries do not reference {{brand}}");
        }
    }

    Ok(())
}
