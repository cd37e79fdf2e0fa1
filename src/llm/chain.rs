use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::provider::AiProvider;
use crate::errors::GeoError;

/// Result of asking an ordered list of providers for the same answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome<T> {
    /// The preferred provider answered.
    Ok { data: T, provider: String },
    /// A fallback provider answered after earlier ones failed.
    Degraded {
        data: T,
        provider: String,
        warnings: Vec<String>,
    },
    AllFailed { errors: Vec<String> },
}

impl<T> ProviderOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProviderOutcome<U> {
        match self {
            Self::Ok { data, provider } => ProviderOutcome::Ok { data: f(data), provider },
            Self::Degraded { data, provider, warnings } => ProviderOutcome::Degraded {
                data: f(data),
                provider,
                warnings,
            },
            Self::AllFailed { errors } => ProviderOutcome::AllFailed { errors },
        }
    }

    /// Collapse into the data and any degradation warnings.
    ///
    /// `AllFailed` becomes [`GeoError::Analysis`] naming `operation`.
    pub fn into_result(self, operation: &str) -> Result<(T, Vec<String>), GeoError> {
        match self {
            Self::Ok { data, .. } => Ok((data, Vec::new())),
            Self::Degraded { data, provider, warnings } => {
                warn!(operation, provider = %provider, ?warnings, "Answered by fallback provider");
                Ok((data, warnings))
            }
            Self::AllFailed { errors } => Err(GeoError::Analysis(format!(
                "{operation}: all AI providers failed ({})",
                errors.join("; ")
            ))),
        }
    }
}

/// Providers in preference order. A provider is only asked when every
/// earlier one failed.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn AiProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn AiProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Ask for a JSON answer, validate it against `schema` and deserialize it.
    pub async fn structured<T: DeserializeOwned>(
        &self,
        operation: &str,
        prompt: &str,
        schema: &Value,
        system: Option<&str>,
    ) -> ProviderOutcome<T> {
        let validator = match jsonschema::JSONSchema::compile(schema) {
            Ok(v) => v,
            Err(e) => {
                return ProviderOutcome::AllFailed {
                    errors: vec![format!("invalid output schema for {operation}: {e}")],
                }
            }
        };

        self.first_success(operation, |provider| {
            let validator = &validator;
            async move {
                let value = provider.complete_json(prompt, schema, system).await?;
                if let Err(errors) = validator.validate(&value) {
                    let messages: Vec<String> =
                        errors.map(|e| format!("{} at {}", e, e.instance_path)).collect();
                    return Err(GeoError::OutputValidation(messages.join("; ")));
                }
                serde_json::from_value::<T>(value)
                    .map_err(|e| GeoError::OutputValidation(e.to_string()))
            }
        })
        .await
    }

    /// Ask for free text.
    pub async fn text(&self, operation: &str, prompt: &str, system: Option<&str>) -> ProviderOutcome<String> {
        self.first_success(operation, |provider| async move {
            let response = provider.complete(prompt, system).await?;
            Ok(response.text)
        })
        .await
    }

    async fn first_success<'a, T, F, Fut>(&'a self, operation: &str, mut call: F) -> ProviderOutcome<T>
    where
        F: FnMut(&'a dyn AiProvider) -> Fut,
        Fut: std::future::Future<Output = Result<T, GeoError>>,
    {
        if self.providers.is_empty() {
            return ProviderOutcome::AllFailed {
                errors: vec!["no AI providers configured".to_string()],
            };
        }

        let mut errors = Vec::new();
        for provider in &self.providers {
            let name = provider.name().to_string();
            debug!(operation, provider = %name, model = provider.model(), "Calling provider");
            match call(provider.as_ref()).await {
                Ok(data) if errors.is_empty() => return ProviderOutcome::Ok { data, provider: name },
                Ok(data) => {
                    return ProviderOutcome::Degraded { data, provider: name, warnings: errors }
                }
                Err(e) => {
                    warn!(operation, provider = %name, error = %e, "Provider call failed");
                    errors.push(format!("{name}: {e}"));
                }
            }
        }
        ProviderOutcome::AllFailed { errors }
    }
}
