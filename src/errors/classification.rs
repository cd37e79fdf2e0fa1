use super::types::GeoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl ErrorClassification {
    const fn new(error_type: &'static str, retryable: bool) -> Self {
        Self { error_type, retryable }
    }
}

impl GeoError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient upstream conditions
            GeoError::Scraping(_) => ErrorClassification::new("ScrapingError", true),
            GeoError::Browser(_) => ErrorClassification::new("BrowserError", true),
            GeoError::Network(_) => ErrorClassification::new("NetworkError", true),
            GeoError::RateLimit(_) => ErrorClassification::new("RateLimitError", true),
            GeoError::LLMApi(_) => ErrorClassification::new("LLMApiError", true),
            GeoError::Database(_) => ErrorClassification::new("DatabaseError", true),
            GeoError::Io(_) => ErrorClassification::new("IoError", true),

            // LM timeouts are surfaced, not retried
            GeoError::Timeout(_) => ErrorClassification::new("TimeoutError", false),

            GeoError::DnsResolution(_) => ErrorClassification::new("DnsResolutionError", false),
            GeoError::Validation(_) => ErrorClassification::new("ValidationError", false),
            GeoError::Config(_) => ErrorClassification::new("ConfigurationError", false),
            GeoError::Analysis(_) => ErrorClassification::new("AnalysisError", false),
            GeoError::Authentication(_) => ErrorClassification::new("AuthenticationError", false),
            GeoError::OutputValidation(_) => {
                ErrorClassification::new("OutputValidationError", false)
            }
            GeoError::NotFound(_) => ErrorClassification::new("NotFoundError", false),
            GeoError::Conflict(_) => ErrorClassification::new("ConflictError", false),
            GeoError::Cancelled(_) => ErrorClassification::new("CancelledError", false),
            GeoError::Json(_) => ErrorClassification::new("JsonError", false),
            GeoError::Yaml(_) => ErrorClassification::new("YamlError", false),
            GeoError::Internal(_) => ErrorClassification::new("UnknownError", false),
            GeoError::Orchestration { error_type, .. } => {
                ErrorClassification::new(error_type, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_error_not_retryable() {
        let class = GeoError::DnsResolution("example.invalid".into()).classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "DnsResolutionError");
    }

    #[test]
    fn test_scraping_error_retryable() {
        let class = GeoError::Scraping("net::ERR_CONNECTION_RESET".into()).classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "ScrapingError");
    }

    #[test]
    fn test_timeout_not_retried() {
        assert!(!GeoError::Timeout("llm call".into()).classify().retryable);
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let class = GeoError::RateLimit("too many requests".into()).classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "RateLimitError");
    }

    #[test]
    fn test_orchestration_keeps_inner_type() {
        let err = GeoError::Orchestration {
            job_id: "j1".into(),
            error_type: "AnalysisError",
            message: "market analysis failed".into(),
        };
        assert_eq!(err.classify().error_type, "AnalysisError");
    }

    #[test]
    fn test_config_error_not_retryable() {
        assert!(!GeoError::Config("missing key".into()).classify().retryable);
    }
}
