use async_trait::async_trait;
use serde_json::Value;

use super::types::Completion;
use crate::errors::GeoError;

/// One AI backend the analysis stages can call. Implementations own their
/// HTTP client and credentials; retry and fallback live in `ProviderChain`.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion, GeoError>;

    /// Asks for a JSON object matching `schema`. Validation against the
    /// schema is left to the caller.
    async fn complete_json(&self, prompt: &str, schema: &Value, system: Option<&str>) -> Result<Value, GeoError>;

    /// Short stable identifier used in logs and error messages.
    fn name(&self) -> &str;

    fn model(&self) -> &str;
}
