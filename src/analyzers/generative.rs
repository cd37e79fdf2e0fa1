use futures::future::join_all;
use regex::RegexBuilder;
use serde_json::Value;
use tracing::{info, warn};

use super::ai::AnalysisService;
use super::StageOutput;
use crate::errors::GeoError;
use crate::llm::ProviderOutcome;
use crate::models::{
    AnalysisJob, CitationMetrics, ClaimVerification, CompetitorVoice, HallucinationMetrics, SentimentMetrics,
    GenerativeReport, SentimentTrend, VerificationResult, VoiceMetrics,
};
use crate::prompts::truncate_chars;

const SENTIMENT_TEXT_CHARS: usize = 4000;
const TOP_CITED_URLS: usize = 5;

/// Share of voice and citations for `brand`/`domain` across AI answers.
pub fn voice_and_citations(
    answers: &[String],
    brand: &str,
    domain: &str,
    competitors: &[String],
) -> (VoiceMetrics, CitationMetrics) {
    let brand_lower = brand.to_lowercase();
    let domain_lower = domain.to_lowercase();
    let url_pattern = format!(r"https?://(?:[^\s/?#]*\.)?{}[^\s]*", regex::escape(&domain_lower));
    let url_re = RegexBuilder::new(&url_pattern).case_insensitive(true).build().ok();
    // The domain or one of its subdomains, not a longer name that ends with it.
    let host_pattern = format!(
        r"(?:^|[^a-z0-9.-])(?:[a-z0-9-]+\.)*{}(?:$|[^a-z0-9.-]|\.(?:$|[^a-z0-9-]))",
        regex::escape(&domain_lower)
    );
    let host_re = RegexBuilder::new(&host_pattern).case_insensitive(true).build().ok();

    let mut mentions = 0u32;
    let mut citations = 0u32;
    let mut cited: Vec<String> = Vec::new();

    for answer in answers {
        let lower = answer.to_lowercase();
        if !brand_lower.is_empty() && lower.contains(&brand_lower) {
            mentions += 1;
        }
        let cites_domain = !domain_lower.is_empty() && host_re.as_ref().is_some_and(|re| re.is_match(&lower));
        if cites_domain {
            citations += 1;
            if let Some(re) = &url_re {
                for m in re.find_iter(answer) {
                    let url = m.as_str().to_string();
                    if !cited.contains(&url) {
                        cited.push(url);
                    }
                }
            }
        }
    }

    let total = answers.len().max(1) as f64;
    let competitors = competitors
        .iter()
        .map(|name| {
            let needle = name.to_lowercase();
            let hits = answers.iter().filter(|a| a.to_lowercase().contains(&needle)).count();
            CompetitorVoice {
                name: name.clone(),
                score: (hits as f64 / total * 100.0).round() as u32,
            }
        })
        .collect();

    cited.truncate(TOP_CITED_URLS);

    (
        VoiceMetrics {
            score: mentions as f64 / total * 100.0,
            competitors,
            mentions,
        },
        CitationMetrics {
            citation_rate: citations as f64 / total * 100.0,
            citations,
            top_cited_urls: cited,
        },
    )
}

fn numeric(value: &Value, key: &str) -> Option<f64> {
    let v = value.get(key)?;
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
}

pub fn sentiment_trend(positive: f64, neutral: f64, negative: f64) -> SentimentTrend {
    if positive > neutral && positive > negative {
        SentimentTrend::Positive
    } else if negative > positive && negative > neutral {
        SentimentTrend::Negative
    } else if (positive - negative).abs() < 10.0 {
        SentimentTrend::Mixed
    } else {
        SentimentTrend::Neutral
    }
}

/// Validate the raw sentiment split; non-numeric values are rejected.
pub fn parse_sentiment(value: &Value) -> Result<SentimentMetrics, GeoError> {
    match (numeric(value, "positive"), numeric(value, "neutral"), numeric(value, "negative")) {
        (Some(positive), Some(neutral), Some(negative)) => Ok(SentimentMetrics {
            positive,
            neutral,
            negative,
            sentiment_trend: sentiment_trend(positive, neutral, negative),
        }),
        _ => Err(GeoError::Validation("AI returned non-numeric sentiment values".into())),
    }
}

pub fn accuracy(examples: Vec<ClaimVerification>) -> HallucinationMetrics {
    if examples.is_empty() {
        return HallucinationMetrics { accuracy_score: 100, examples };
    }
    let verified = examples
        .iter()
        .filter(|e| e.verification_result == VerificationResult::Verified)
        .count();
    HallucinationMetrics {
        accuracy_score: (verified as f64 / examples.len() as f64 * 100.0).round() as u32,
        examples,
    }
}

fn take<T>(outcome: ProviderOutcome<T>, operation: &str, warnings: &mut Vec<String>) -> Result<T, GeoError> {
    let (data, w) = outcome.into_result(operation)?;
    warnings.extend(w);
    Ok(data)
}

/// Simulate how AI answer engines talk about `brand`.
pub async fn run_generative(
    job: &AnalysisJob,
    brand: &str,
    seed_queries: &[String],
    ai: &dyn AnalysisService,
) -> Result<StageOutput<GenerativeReport>, GeoError> {
    let market = job
        .business_analysis
        .as_ref()
        .ok_or_else(|| GeoError::Validation("business analysis with competitors is required".into()))?;
    let content = job
        .scraped_content
        .as_deref()
        .ok_or_else(|| GeoError::Validation("scraped content is required for claim verification".into()))?;
    let domain = job.hostname().unwrap_or_else(|| job.url.clone());

    info!(job_id = %job.id, brand, queries = seed_queries.len(), "Running generative performance analysis");

    let mut warnings = Vec::new();
    let mut answers = Vec::new();
    let mut errors = Vec::new();
    let queries: Vec<String> = seed_queries.iter().map(|t| t.replace("{brand}", brand)).collect();
    let outcomes = join_all(queries.iter().map(|q| ai.answer_query(q))).await;
    for (query, outcome) in queries.iter().zip(outcomes) {
        match outcome {
            ProviderOutcome::Ok { data, .. } => answers.push(data),
            ProviderOutcome::Degraded { data, warnings: w, .. } => {
                warnings.extend(w);
                answers.push(data);
            }
            ProviderOutcome::AllFailed { errors: e } => {
                warn!(job_id = %job.id, query = %query, "No provider answered seed query");
                errors.push(format!("{}: {}", query, e.join("; ")));
            }
        }
    }
    if answers.is_empty() && !seed_queries.is_empty() {
        return Err(GeoError::Analysis(format!(
            "no AI answers collected: {}",
            errors.join(", ")
        )));
    }
    warnings.extend(errors);

    let competitor_names: Vec<String> = market
        .competitors
        .business_competitors
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let (voice, citations) = voice_and_citations(&answers, brand, &domain, &competitor_names);

    let combined = answers.join(" ");
    let raw_sentiment = take(
        ai.sentiment(brand, truncate_chars(&combined, SENTIMENT_TEXT_CHARS)).await,
        "sentiment",
        &mut warnings,
    )?;
    let sentiment = parse_sentiment(&raw_sentiment)?;

    let claims = take(ai.extract_claims(brand, &combined).await, "extract_claims", &mut warnings)?;
    let hallucination = if claims.is_empty() {
        accuracy(Vec::new())
    } else {
        accuracy(take(ai.verify_claims(&claims, content).await, "verify_claims", &mut warnings)?)
    };

    for w in &warnings {
        warn!(job_id = %job.id, warning = %w, "Generative analysis degraded");
    }
    info!(
        job_id = %job.id,
        share_of_voice = voice.score,
        citation_rate = citations.citation_rate,
        accuracy = hallucination.accuracy_score,
        "Generative performance analysis complete"
    );

    Ok(StageOutput::new(
        GenerativeReport {
            share_of_generative_voice: voice,
            citation_analysis: citations,
            sentiment_analysis: sentiment,
            accuracy_and_hallucination: hallucination,
        },
        warnings,
    ))
}
