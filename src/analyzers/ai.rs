use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::{ProviderChain, ProviderOutcome};
use crate::models::{
    AnalysisJob, BusinessModel, ClaimVerification, CompetitorAnalysis, EeatAssessment, ScoredEvaluation,
    StrategicAgenda, TargetAudience,
};
use crate::prompts::{self, render, truncate_chars};

const MARKET_CONTENT_CHARS: usize = 8000;
const EEAT_CONTENT_CHARS: usize = 12000;
const SENTIMENT_TEXT_CHARS: usize = 4000;
const CLAIM_TEXT_CHARS: usize = 8000;
const REPORT_CHARS: usize = 6000;

/// Typed language-model analyses used by the stage analyzers.
///
/// Every call reports which provider answered and what failed before it.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn business_model(&self, url: &str, content: &str) -> ProviderOutcome<BusinessModel>;
    async fn target_audience(&self, url: &str, content: &str) -> ProviderOutcome<TargetAudience>;
    async fn competitors(&self, url: &str, content: &str) -> ProviderOutcome<CompetitorAnalysis>;
    async fn eeat(&self, url: &str, content: &str, sector: &str, audience: &str) -> ProviderOutcome<EeatAssessment>;
    async fn agenda(&self, url: &str, evaluation: &ScoredEvaluation) -> ProviderOutcome<StrategicAgenda>;
    async fn answer_query(&self, query: &str) -> ProviderOutcome<String>;
    /// Raw `{positive, neutral, negative}`; callers validate the numbers.
    async fn sentiment(&self, brand: &str, text: &str) -> ProviderOutcome<Value>;
    async fn extract_claims(&self, brand: &str, text: &str) -> ProviderOutcome<Vec<String>>;
    async fn verify_claims(&self, claims: &[String], context: &str) -> ProviderOutcome<Vec<ClaimVerification>>;
    async fn enhanced_narrative(&self, job: &AnalysisJob) -> ProviderOutcome<Value>;
}

#[derive(Deserialize)]
struct ClaimsEnvelope {
    #[serde(default)]
    claims: Vec<String>,
}

#[derive(Deserialize)]
struct VerificationEnvelope {
    #[serde(default)]
    examples: Vec<ClaimVerification>,
}

/// [`AnalysisService`] backed by an ordered provider chain.
#[derive(Clone)]
pub struct LlmAnalysisService {
    chain: ProviderChain,
}

impl LlmAnalysisService {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl AnalysisService for LlmAnalysisService {
    async fn business_model(&self, url: &str, content: &str) -> ProviderOutcome<BusinessModel> {
        let prompt = render(
            prompts::BUSINESS_MODEL,
            &[("URL", url), ("CONTENT", truncate_chars(content, MARKET_CONTENT_CHARS))],
        );
        self.chain
            .structured("business_model", &prompt, &business_model_schema(), Some(prompts::SEO_SYSTEM))
            .await
    }

    async fn target_audience(&self, url: &str, content: &str) -> ProviderOutcome<TargetAudience> {
        let prompt = render(
            prompts::TARGET_AUDIENCE,
            &[("URL", url), ("CONTENT", truncate_chars(content, MARKET_CONTENT_CHARS))],
        );
        self.chain
            .structured("target_audience", &prompt, &target_audience_schema(), Some(prompts::SEO_SYSTEM))
            .await
    }

    async fn competitors(&self, url: &str, content: &str) -> ProviderOutcome<CompetitorAnalysis> {
        let prompt = render(
            prompts::COMPETITORS,
            &[("URL", url), ("CONTENT", truncate_chars(content, MARKET_CONTENT_CHARS))],
        );
        self.chain
            .structured("competitors", &prompt, &competitors_schema(), Some(prompts::SEO_SYSTEM))
            .await
    }

    async fn eeat(&self, url: &str, content: &str, sector: &str, audience: &str) -> ProviderOutcome<EeatAssessment> {
        let prompt = render(
            prompts::EEAT,
            &[
                ("URL", url),
                ("SECTOR", sector),
                ("AUDIENCE", audience),
                ("CONTENT", truncate_chars(content, EEAT_CONTENT_CHARS)),
            ],
        );
        self.chain
            .structured("eeat", &prompt, &eeat_schema(), Some(prompts::SEO_SYSTEM))
            .await
    }

    async fn agenda(&self, url: &str, evaluation: &ScoredEvaluation) -> ProviderOutcome<StrategicAgenda> {
        let evaluation_json = serde_json::to_string(evaluation).unwrap_or_default();
        let questions = prompts::AGENDA_QUESTIONS
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = render(
            prompts::AGENDA,
            &[
                ("URL", url),
                ("QUESTIONS", &questions),
                ("EVALUATION", truncate_chars(&evaluation_json, REPORT_CHARS)),
            ],
        );
        self.chain
            .structured("agenda", &prompt, &agenda_schema(), Some(prompts::SEO_SYSTEM))
            .await
    }

    async fn answer_query(&self, query: &str) -> ProviderOutcome<String> {
        self.chain
            .text("answer_query", query, Some(prompts::SEARCH_ENGINE_SYSTEM))
            .await
    }

    async fn sentiment(&self, brand: &str, text: &str) -> ProviderOutcome<Value> {
        let prompt = render(
            prompts::SENTIMENT,
            &[("BRAND", brand), ("TEXT", truncate_chars(text, SENTIMENT_TEXT_CHARS))],
        );
        self.chain
            .structured("sentiment", &prompt, &sentiment_schema(), None)
            .await
    }

    async fn extract_claims(&self, brand: &str, text: &str) -> ProviderOutcome<Vec<String>> {
        let prompt = render(
            prompts::EXTRACT_CLAIMS,
            &[("BRAND", brand), ("TEXT", truncate_chars(text, CLAIM_TEXT_CHARS))],
        );
        self.chain
            .structured::<ClaimsEnvelope>("extract_claims", &prompt, &claims_schema(), None)
            .await
            .map(|env| env.claims)
    }

    async fn verify_claims(&self, claims: &[String], context: &str) -> ProviderOutcome<Vec<ClaimVerification>> {
        let claims_json = serde_json::to_string(claims).unwrap_or_default();
        let prompt = render(
            prompts::VERIFY_CLAIMS,
            &[("CONTEXT", truncate_chars(context, CLAIM_TEXT_CHARS)), ("CLAIMS", &claims_json)],
        );
        self.chain
            .structured::<VerificationEnvelope>("verify_claims", &prompt, &verification_schema(), None)
            .await
            .map(|env| env.examples)
    }

    async fn enhanced_narrative(&self, job: &AnalysisJob) -> ProviderOutcome<Value> {
        let section = |v: Option<String>| v.unwrap_or_default();
        let market = section(job.business_analysis.as_ref().and_then(|m| serde_json::to_string(m).ok()));
        let evaluation = section(job.scored_evaluation.as_ref().and_then(|s| serde_json::to_string(s).ok()));
        let generative = section(
            job.generative_performance_report
                .as_ref()
                .and_then(|g| serde_json::to_string(g).ok()),
        );
        let prompt = render(
            prompts::ENHANCED_NARRATIVE,
            &[
                ("URL", &job.url),
                ("MARKET", truncate_chars(&market, REPORT_CHARS)),
                ("EVALUATION", truncate_chars(&evaluation, REPORT_CHARS)),
                ("GENERATIVE", truncate_chars(&generative, REPORT_CHARS)),
            ],
        );
        self.chain
            .structured::<Value>("enhanced_narrative", &prompt, &json!({ "type": "object" }), Some(prompts::SEO_SYSTEM))
            .await
            .map(|v| v.get("enhancedAnalysis").cloned().unwrap_or(v))
    }
}

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn business_model_schema() -> Value {
    json!({
        "type": "object",
        "required": ["modelType", "confidence", "justification"],
        "properties": {
            "brandName": { "type": ["string", "null"] },
            "modelType": { "type": "string" },
            "confidence": { "type": "number" },
            "justification": { "type": "string" },
            "keyRevenueStreams": string_array()
        }
    })
}

fn target_audience_schema() -> Value {
    json!({
        "type": "object",
        "required": ["primaryAudience", "confidence", "justification"],
        "properties": {
            "primaryAudience": {
                "type": "object",
                "required": ["demographics", "psychographics"],
                "properties": {
                    "demographics": { "type": "string" },
                    "psychographics": { "type": "string" }
                }
            },
            "secondaryAudiences": string_array(),
            "confidence": { "type": "number" },
            "justification": { "type": "string" }
        }
    })
}

fn competitors_schema() -> Value {
    json!({
        "type": "object",
        "required": ["summary", "confidence"],
        "properties": {
            "businessCompetitors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "url", "reason"],
                    "properties": {
                        "name": { "type": "string" },
                        "url": { "type": "string" },
                        "reason": { "type": "string" }
                    }
                }
            },
            "contentCompetitors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["topic", "url", "reason"],
                    "properties": {
                        "topic": { "type": "string" },
                        "url": { "type": "string" },
                        "reason": { "type": "string" }
                    }
                }
            },
            "summary": { "type": "string" },
            "confidence": { "type": "number" }
        }
    })
}

fn eeat_schema() -> Value {
    let component = json!({
        "type": "object",
        "required": ["score", "justification"],
        "properties": {
            "score": { "type": "number" },
            "justification": { "type": "string" },
            "suggestions": string_array(),
            "positiveSignals": string_array(),
            "negativeSignals": string_array()
        }
    });
    json!({
        "type": "object",
        "required": ["eeatAnalysis", "executiveSummary"],
        "properties": {
            "eeatAnalysis": {
                "type": "object",
                "required": ["experience", "expertise", "authoritativeness", "trustworthiness", "overallScore"],
                "properties": {
                    "experience": component.clone(),
                    "expertise": component.clone(),
                    "authoritativeness": component.clone(),
                    "trustworthiness": component,
                    "overallScore": { "type": "number" }
                }
            },
            "executiveSummary": { "type": "string" },
            "actionPlan": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["priority", "description", "category"],
                    "properties": {
                        "priority": { "type": "string" },
                        "description": { "type": "string" },
                        "category": { "type": "string" },
                        "impactScore": { "type": "number" },
                        "effortScore": { "type": "number" },
                        "rationale": { "type": "string" }
                    }
                }
            },
            "geoScoreDetails": { "type": "object" }
        }
    })
}

fn agenda_schema() -> Value {
    json!({
        "type": "object",
        "required": ["sessionFocus", "strategicGoals", "customizedQuestions"],
        "properties": {
            "sessionFocus": { "type": "string" },
            "strategicGoals": string_array(),
            "customizedQuestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["questionId", "original", "customized"],
                    "properties": {
                        "questionId": { "type": "integer", "minimum": 0 },
                        "original": { "type": "string" },
                        "customized": { "type": "string" }
                    }
                }
            }
        }
    })
}

fn sentiment_schema() -> Value {
    json!({
        "type": "object",
        "required": ["positive", "neutral", "negative"]
    })
}

fn claims_schema() -> Value {
    json!({
        "type": "object",
        "required": ["claims"],
        "properties": { "claims": string_array() }
    })
}

fn verification_schema() -> Value {
    json!({
        "type": "object",
        "required": ["examples"],
        "properties": {
            "examples": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["claim", "verificationResult"],
                    "properties": {
                        "claim": { "type": "string" },
                        "sourceText": { "type": "string" },
                        "verificationResult": { "enum": ["verified", "unverified", "contradictory"] },
                        "explanation": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiles(schema: &Value) -> bool {
        jsonschema::JSONSchema::compile(schema).is_ok()
    }

    #[test]
    fn test_schemas_compile() {
        for schema in [
            business_model_schema(),
            target_audience_schema(),
            competitors_schema(),
            eeat_schema(),
            agenda_schema(),
            sentiment_schema(),
            claims_schema(),
            verification_schema(),
        ] {
            assert!(compiles(&schema));
        }
    }

    #[test]
    fn test_verification_schema_rejects_unknown_result() {
        let schema = jsonschema::JSONSchema::compile(&verification_schema()).unwrap();
        let bad = json!({ "examples": [{ "claim": "x", "verificationResult": "maybe" }] });
        assert!(!schema.is_valid(&bad));
        let good = json!({ "examples": [{ "claim": "x", "verificationResult": "verified" }] });
        assert!(schema.is_valid(&good));
    }

    #[test]
    fn test_competitor_schema_requires_names() {
        let schema = jsonschema::JSONSchema::compile(&competitors_schema()).unwrap();
        let bad = json!({
            "businessCompetitors": [{ "url": "https://x", "reason": "r" }],
            "summary": "s", "confidence": 50
        });
        assert!(!schema.is_valid(&bad));
    }
}
