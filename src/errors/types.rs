use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Output validation error: {0}")]
    OutputValidation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Terminal failure of a job run, after the failure has been persisted.
    #[error("Analysis of job {job_id} failed ({error_type}): {message}")]
    Orchestration {
        job_id: String,
        error_type: &'static str,
        message: String,
    },
}

impl GeoError {
    /// Map an HTTP client failure talking to `service`. The request URL is
    /// dropped because some services take their API key as a query parameter.
    pub fn transport(service: &str, e: reqwest::Error) -> Self {
        let timed_out = e.is_timeout();
        let e = e.without_url();
        if timed_out {
            GeoError::Timeout(format!("{service} request timed out: {e}"))
        } else {
            GeoError::Network(format!("{service} request failed: {e}"))
        }
    }

    /// Short reason suitable for the job's user-visible `error` field.
    ///
    /// Internal kinds are flattened to a generic message so that paths,
    /// SQL and serializer output never reach a client.
    pub fn user_message(&self) -> String {
        match self {
            GeoError::Validation(m)
            | GeoError::Config(m)
            | GeoError::Scraping(m)
            | GeoError::Analysis(m)
            | GeoError::Authentication(m)
            | GeoError::LLMApi(m)
            | GeoError::RateLimit(m)
            | GeoError::Timeout(m)
            | GeoError::Network(m)
            | GeoError::OutputValidation(m)
            | GeoError::NotFound(m)
            | GeoError::Conflict(m)
            | GeoError::Cancelled(m)
            | GeoError::Browser(m) => m.clone(),
            GeoError::DnsResolution(m) => format!("DNS resolution failed: {m}"),
            GeoError::Orchestration { message, .. } => message.clone(),
            GeoError::Io(_)
            | GeoError::Json(_)
            | GeoError::Yaml(_)
            | GeoError::Database(_)
            | GeoError::Internal(_) => "internal error during analysis".to_string(),
        }
    }
}
