use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
                    "internal_token": { "type": "string" }
                }
            },
            "store": {
                "type": "object",
                "properties": {
                    "backend": { "type": "string", "enum": ["sqlite", "memory"] },
                    "path": { "type": "string" }
                }
            },
            "fetch": {
                "type": "object",
                "properties": {
                    "scraper_url": { "type": "string", "format": "uri" },
                    "remote_only": { "type": "boolean" },
                    "remote_timeout_secs": { "type": "integer", "minimum": 1 },
                    "local_attempts": { "type": "integer", "minimum": 1 },
                    "local_retry_delay_ms": { "type": "integer", "minimum": 0 },
                    "nav_timeout_secs": { "type": "integer", "minimum": 1 },
                    "sidecar_timeout_secs": { "type": "integer", "minimum": 1 },
                    "min_content_chars": { "type": "integer", "minimum": 0 },
                    "chrome_path": { "type": "string" },
                    "serverless": { "type": "boolean" }
                }
            },
            "llm": {
                "type": "object",
                "properties": {
                    "timeout_secs": { "type": "integer", "minimum": 1 },
                    "providers": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["provider"],
                            "properties": {
                                "provider": { "type": "string", "enum": ["openai", "gemini"] },
                                "model": { "type": "string" },
                                "api_key": { "type": "string" },
                                "base_url": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "pagespeed": {
                "type": "object",
                "properties": {
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" },
                    "strategy": { "type": "string", "enum": ["MOBILE", "DESKTOP"] },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "analysis": {
                "type": "object",
                "properties": {
                    "seed_queries": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
});
