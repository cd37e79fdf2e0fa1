//! Prompt templates for the analysis calls.
//!
//! Templates use `{{NAME}}` placeholders filled by [`render`].

pub const SEO_SYSTEM: &str = "You are an expert SEO analyst specializing in AI search engines such as \
Google AI Overviews, Perplexity and ChatGPT. Focus on content quality, user intent and E-E-A-T \
(Experience, Expertise, Authoritativeness, Trustworthiness). Always answer with a single JSON object.";

pub const SEARCH_ENGINE_SYSTEM: &str = "You are an AI search engine. Give the most helpful and reliable \
answer to the user's query using trusted web sources, and cite the URLs you rely on.";

pub const BUSINESS_MODEL: &str = r#"Analyze the website content from {{URL}} and determine its primary business model.
Content: """{{CONTENT}}"""

Respond with JSON:
{"brandName": "string", "modelType": "E-commerce | SaaS | Lead Generation | Content/Media | Marketplace | Other",
 "confidence": 0-100, "justification": "string", "keyRevenueStreams": ["string"]}"#;

pub const TARGET_AUDIENCE: &str = r#"Analyze the website content from {{URL}} and identify its target audience.
Content: """{{CONTENT}}"""

Respond with JSON:
{"primaryAudience": {"demographics": "string", "psychographics": "string"},
 "secondaryAudiences": ["string"], "confidence": 0-100, "justification": "string"}"#;

pub const COMPETITORS: &str = r#"Identify the main business and content competitors of {{URL}}.
Content: """{{CONTENT}}"""

Respond with JSON:
{"businessCompetitors": [{"name": "string", "url": "string", "reason": "string"}],
 "contentCompetitors": [{"topic": "string", "url": "string", "reason": "string"}],
 "summary": "string", "confidence": 0-100}"#;

pub const EEAT: &str = r#"Evaluate the E-E-A-T signals of the content from {{URL}} for the {{SECTOR}} sector,
targeting {{AUDIENCE}}. Justify every score with concrete positive and negative signals from the text,
then write an executive summary and an action plan of at least five items.
Content: """{{CONTENT}}"""

Respond with JSON:
{"eeatAnalysis": {
   "experience": {"score": 0-100, "justification": "string", "suggestions": ["string"], "positiveSignals": ["string"], "negativeSignals": ["string"]},
   "expertise": {...same shape...}, "authoritativeness": {...same shape...}, "trustworthiness": {...same shape...},
   "overallScore": 0-100},
 "executiveSummary": "string",
 "actionPlan": [{"priority": "high | medium | low", "description": "string", "category": "string",
                 "impactScore": 1-10, "effortScore": 1-10, "rationale": "string"}],
 "geoScoreDetails": {"marketPotential": "high | medium | low", "competitionIntensity": "high | medium | low",
                     "growthTrend": "positive | negative | stable", "brandAwareness": "high | medium | low"}}"#;

pub const AGENDA: &str = r#"Based on this scored GEO evaluation of {{URL}}, prepare an agenda for a strategy session.
Identify the session focus, set strategic goals, and customize each of these questions for the site:
{{QUESTIONS}}
Evaluation: """{{EVALUATION}}"""

Respond with JSON:
{"sessionFocus": "string", "strategicGoals": ["string"],
 "customizedQuestions": [{"questionId": 1, "original": "string", "customized": "string"}]}"#;

pub const AGENDA_QUESTIONS: &[&str] = &[
    "Which customer questions should AI assistants answer with our content?",
    "Where do competitors appear in AI answers instead of us?",
    "Which pages carry the strongest expertise and trust signals?",
    "What structured data would make our offering unambiguous to AI engines?",
    "Which improvements give the largest visibility gain for the least effort?",
];

pub const SENTIMENT: &str = r#"Analyze the sentiment toward {{BRAND}} in the following text and score the
positive, neutral and negative share.
Text: """{{TEXT}}"""

Respond with JSON: {"positive": 0-100, "neutral": 0-100, "negative": 0-100}"#;

pub const EXTRACT_CLAIMS: &str = r#"Extract the verifiable factual claims about {{BRAND}} from the following text.
Text: """{{TEXT}}"""

Respond with JSON: {"claims": ["string"]}"#;

pub const VERIFY_CLAIMS: &str = r#"Verify each claim against the ground truth text. Mark each one verified,
unverified or contradictory.
Ground truth: """{{CONTEXT}}"""
Claims: {{CLAIMS}}

Respond with JSON:
{"examples": [{"claim": "string", "sourceText": "string", "verificationResult": "verified | unverified | contradictory",
               "explanation": "string"}]}"#;

pub const ENHANCED_NARRATIVE: &str = r#"Write a strategic impact narrative for executives from these reports on {{URL}}.
Market analysis: """{{MARKET}}"""
Scored evaluation: """{{EVALUATION}}"""
Generative performance: """{{GENERATIVE}}"""

Respond with JSON:
{"enhancedAnalysis": {"geoOpportunityScore": 0-100,
  "estimatedImpact": {"trafficIncrease": "string", "visibilityIncrease": "string", "conversionIncrease": "string"},
  "timeToImpact": "string",
  "riskAssessment": {"trafficLossRisk": "string", "reputationRisk": "string"},
  "geoSwotAnalysis": {"strengths": ["string"], "weaknesses": ["string"], "opportunities": ["string"], "threats": ["string"]}}}"#;

/// Replace `{{NAME}}` placeholders. Unknown placeholders are left in place.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (name, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", name), value);
    }
    result
}

/// First `max` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let out = render("Hello {{URL}} / {{URL}} {{MISSING}}", &[("URL", "https://a.example")]);
        assert_eq!(out, "Hello https://a.example / https://a.example {{MISSING}}");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("çağrı", 3), "çağ");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_templates_reference_content() {
        for t in [BUSINESS_MODEL, TARGET_AUDIENCE, COMPETITORS, EEAT] {
            assert!(t.contains("{{CONTENT}}"));
        }
    }
}
