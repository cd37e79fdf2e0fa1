use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::GeoError;
use super::json::extract_json;
use super::provider::AiProvider;
use super::types::{Completion, TokenUsage};

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, base_url: &str, timeout: Duration) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoError::Config(format!("Failed to build Gemini client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion, GeoError> {
        let text = match system {
            Some(sys) => format!("System: {}\n\n{}", sys, prompt),
            None => prompt.to_string(),
        };

        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": text}]}],
            "generationConfig": {
                "temperature": 0.2,
                "maxOutputTokens": 8192,
            }
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let resp = self.client.post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeoError::transport("Gemini", e))?;

        match resp.status().as_u16() {
            429 => return Err(GeoError::RateLimit("Gemini rate limit".into())),
            401 | 403 => return Err(GeoError::Authentication("Invalid Gemini API key".into())),
            _ => {}
        }

        let data: Value = resp.json().await
            .map_err(|e| GeoError::LLMApi(format!("Parse error: {}", e.without_url())))?;

        if let Some(error) = data.get("error") {
            return Err(GeoError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| GeoError::LLMApi("Gemini returned an empty response".into()))?
            .to_string();

        Ok(Completion {
            text: content,
            model: self.model.clone(),
            usage: TokenUsage {
                prompt: data["usageMetadata"]["promptTokenCount"].as_u64(),
                completion: data["usageMetadata"]["candidatesTokenCount"].as_u64(),
            },
        })
    }

    async fn complete_json(&self, prompt: &str, schema: &Value, system: Option<&str>) -> Result<Value, GeoError> {
        let augmented = format!(
            "{}\n\nRespond with ONLY valid JSON matching:\n{}",
            prompt,
            serde_json::to_string_pretty(schema).unwrap_or_default()
        );
        let response = self.complete(&augmented, system).await?;
        extract_json(&response.text)
    }

    fn name(&self) -> &str { "gemini" }
    fn model(&self) -> &str { &self.model }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::chain::ProviderChain;

    #[tokio::test]
    async fn test_failed_call_does_not_expose_key() {
        let provider = GeminiProvider::new(
            "GEMSECRET456",
            "gemini-1.5-flash",
            "http://127.0.0.1:9/v1beta",
            Duration::from_secs(2),
        )
        .unwrap();
        let chain = ProviderChain::new(vec![Arc::new(provider)]);

        let err = chain
            .text("answer", "What is example.com?", None)
            .await
            .into_result("answer")
            .unwrap_err();

        assert!(err.user_message().contains("gemini"));
        assert!(!err.user_message().contains("GEMSECRET456"));
    }
}
