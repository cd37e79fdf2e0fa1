use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricRating {
    Good,
    NeedsImprovement,
    Poor,
}

impl MetricRating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::NeedsImprovement => "NEEDS_IMPROVEMENT",
            Self::Poor => "POOR",
        }
    }
}

impl std::fmt::Display for MetricRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatedMetric {
    pub value: f64,
    pub rating: MetricRating,
}

/// Field data from the Chrome UX Report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CruxData {
    pub overall_rating: MetricRating,
    pub metrics: BTreeMap<String, RatedMetric>,
}

/// Lab data from a Lighthouse run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseData {
    pub overall_score: f64,
    pub metrics: BTreeMap<String, RatedMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub url: String,
    pub has_crux_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crux: Option<CruxData>,
    pub lighthouse: LighthouseData,
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    pub model_type: String,
    pub confidence: f64,
    pub justification: String,
    #[serde(default)]
    pub key_revenue_streams: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudienceSegment {
    pub demographics: String,
    pub psychographics: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    pub primary_audience: AudienceSegment,
    #[serde(default)]
    pub secondary_audiences: Vec<String>,
    pub confidence: f64,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessCompetitor {
    pub name: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentCompetitor {
    pub topic: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysis {
    #[serde(default)]
    pub business_competitors: Vec<BusinessCompetitor>,
    #[serde(default)]
    pub content_competitors: Vec<ContentCompetitor>,
    pub summary: String,
    pub confidence: f64,
}

/// Output of the market stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub business_model: BusinessModel,
    pub target_audience: TargetAudience,
    pub competitors: CompetitorAnalysis,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EeatComponent {
    pub score: f64,
    pub justification: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub positive_signals: Vec<String>,
    #[serde(default)]
    pub negative_signals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EeatAnalysis {
    pub experience: EeatComponent,
    pub expertise: EeatComponent,
    pub authoritativeness: EeatComponent,
    pub trustworthiness: EeatComponent,
    pub overall_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlanItem {
    pub priority: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoScoreDetails {
    pub market_potential: String,
    pub competition_intensity: String,
    pub growth_trend: String,
    pub brand_awareness: String,
}

/// Structured E-E-A-T assessment returned by the language model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EeatAssessment {
    pub eeat_analysis: EeatAnalysis,
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default)]
    pub action_plan: Vec<ActionPlanItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_score_details: Option<GeoScoreDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    pub score: f64,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positive_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub negative_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl MetricScore {
    pub fn new(score: f64, justification: impl Into<String>) -> Self {
        Self {
            score,
            justification: justification.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pillar {
    pub score: u32,
    pub weight: f64,
    pub metrics: BTreeMap<String, MetricScore>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScoreInterpretation {
    Leader,
    Developing,
    Weak,
}

impl ScoreInterpretation {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            Self::Leader
        } else if score >= 50 {
            Self::Developing
        } else {
            Self::Weak
        }
    }
}

/// Output of the scoring stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEvaluation {
    pub score_interpretation: ScoreInterpretation,
    pub executive_summary: String,
    pub overall_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_score_details: Option<GeoScoreDetails>,
    pub pillars: BTreeMap<String, Pillar>,
    #[serde(default)]
    pub action_plan: Vec<ActionPlanItem>,
}

// ---------------------------------------------------------------------------
// Agenda
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomizedQuestion {
    pub question_id: u32,
    pub original: String,
    pub customized: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategicAgenda {
    pub session_focus: String,
    #[serde(default)]
    pub strategic_goals: Vec<String>,
    #[serde(default)]
    pub customized_questions: Vec<CustomizedQuestion>,
}

// ---------------------------------------------------------------------------
// Generative performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitorVoice {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceMetrics {
    pub score: f64,
    pub competitors: Vec<CompetitorVoice>,
    pub mentions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CitationMetrics {
    pub citation_rate: f64,
    pub citations: u32,
    pub top_cited_urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTrend {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentMetrics {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub sentiment_trend: SentimentTrend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationResult {
    Verified,
    Unverified,
    Contradictory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimVerification {
    pub claim: String,
    #[serde(default)]
    pub source_text: String,
    pub verification_result: VerificationResult,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HallucinationMetrics {
    pub accuracy_score: u32,
    pub examples: Vec<ClaimVerification>,
}

/// Output of the generative performance stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerativeReport {
    pub share_of_generative_voice: VoiceMetrics,
    pub citation_analysis: CitationMetrics,
    pub sentiment_analysis: SentimentMetrics,
    pub accuracy_and_hallucination: HallucinationMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(ScoreInterpretation::from_score(80), ScoreInterpretation::Leader);
        assert_eq!(ScoreInterpretation::from_score(79), ScoreInterpretation::Developing);
        assert_eq!(ScoreInterpretation::from_score(50), ScoreInterpretation::Developing);
        assert_eq!(ScoreInterpretation::from_score(49), ScoreInterpretation::Weak);
    }

    #[test]
    fn test_market_report_reads_camel_case() {
        let report: MarketReport = serde_json::from_value(serde_json::json!({
            "businessModel": {
                "brandName": "Acme",
                "modelType": "SaaS",
                "confidence": 80,
                "justification": "pricing page",
                "keyRevenueStreams": ["subscriptions"]
            },
            "targetAudience": {
                "primaryAudience": {"demographics": "25-40", "psychographics": "builders"},
                "secondaryAudiences": [],
                "confidence": 70,
                "justification": "copy"
            },
            "competitors": {
                "businessCompetitors": [{"name": "Globex", "url": "https://globex.example", "reason": "same niche"}],
                "contentCompetitors": [],
                "summary": "crowded",
                "confidence": 60
            }
        }))
        .unwrap();
        assert_eq!(report.business_model.brand_name.as_deref(), Some("Acme"));
        assert_eq!(report.competitors.business_competitors[0].name, "Globex");
    }
}
