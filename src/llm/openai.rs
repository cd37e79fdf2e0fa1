use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::GeoError;
use super::json::extract_json;
use super::provider::AiProvider;
use super::types::{Completion, TokenUsage};

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, model: &str, base_url: &str, timeout: Duration) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoError::Config(format!("Failed to build OpenAI client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn chat(&self, messages: Vec<Value>, json_mode: bool) -> Result<Value, GeoError> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": 4096,
        });
        if json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let resp = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| GeoError::transport("OpenAI", e))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(GeoError::RateLimit("OpenAI rate limit".into()));
        }
        if status.as_u16() == 401 {
            return Err(GeoError::Authentication("Invalid OpenAI API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| GeoError::LLMApi(format!("Failed to parse OpenAI response: {}", e.without_url())))?;

        if let Some(error) = data.get("error") {
            return Err(GeoError::LLMApi(error["message"].as_str().unwrap_or("Unknown").to_string()));
        }
        Ok(data)
    }
}

fn messages(prompt: &str, system: Option<&str>) -> Vec<Value> {
    let mut messages = Vec::new();
    if let Some(sys) = system {
        messages.push(json!({"role": "system", "content": sys}));
    }
    messages.push(json!({"role": "user", "content": prompt}));
    messages
}

#[async_trait]
impl AiProvider for OpenAIProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion, GeoError> {
        let data = self.chat(messages(prompt, system), false).await?;

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| GeoError::LLMApi("No content in OpenAI response".into()))?
            .to_string();

        Ok(Completion {
            text: content,
            model: self.model.clone(),
            usage: TokenUsage {
                prompt: data["usage"]["prompt_tokens"].as_u64(),
                completion: data["usage"]["completion_tokens"].as_u64(),
            },
        })
    }

    async fn complete_json(&self, prompt: &str, schema: &Value, system: Option<&str>) -> Result<Value, GeoError> {
        let augmented = format!(
            "{}\n\nRespond ONLY with valid JSON matching this schema:\n{}",
            prompt,
            serde_json::to_string_pretty(schema).unwrap_or_default()
        );
        let data = self.chat(messages(&augmented, system), true).await?;

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| GeoError::LLMApi("No content in OpenAI structured response".into()))?;
        extract_json(content)
    }

    fn name(&self) -> &str { "openai" }
    fn model(&self) -> &str { &self.model }
}
