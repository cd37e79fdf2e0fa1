use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::ai::AnalysisService;
use super::StageOutput;
use crate::errors::GeoError;
use crate::models::{
    AnalysisJob, EeatAnalysis, EeatComponent, MetricRating, MetricScore, PerformanceReport, Pillar,
    ScoreInterpretation, ScoredEvaluation,
};

/// Pillar weights. They sum to 1.0.
pub const PILLAR_WEIGHTS: &[(&str, f64)] = &[
    ("performance", 0.20),
    ("contentStructure", 0.15),
    ("eeatSignals", 0.20),
    ("technicalGEO", 0.10),
    ("structuredData", 0.05),
    ("brandAuthority", 0.10),
    ("entityOptimization", 0.10),
    ("contentStrategy", 0.10),
];

pub const DATA_UNAVAILABLE: &str = "dataUnavailable";
const LIGHTHOUSE_OVERALL: &str = "overallLighthouseScore";
const NO_PILLAR_SCORE: u32 = 5;

static JSON_LD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<script[^>]+type\s*=\s*["']application/ld\+json["']"#).expect("static regex")
});
static VIEWPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+name\s*=\s*["']viewport["']"#).expect("static regex"));

fn metric_weight(key: &str) -> f64 {
    match key {
        "knowledgeGraphPresence" => 0.5,
        "entityReconciliation" | "entityCompleteness" => 0.25,
        _ => 0.0,
    }
}

/// Score one pillar from its metrics, 0..=100.
///
/// Entity metrics carry dedicated weights; when any is present only those
/// count. Each negative point costs 5, each NEEDS_IMPROVEMENT justification 5
/// and each POOR justification 10.
pub fn pillar_score(metrics: &BTreeMap<String, MetricScore>) -> u32 {
    let values: Vec<(&str, &MetricScore)> = metrics
        .iter()
        .filter(|(k, _)| k.as_str() != LIGHTHOUSE_OVERALL)
        .map(|(k, m)| (k.as_str(), m))
        .collect();
    if values.is_empty() {
        return 0;
    }

    let plain_mean = || values.iter().map(|(_, m)| m.score).sum::<f64>() / values.len() as f64;

    let mut score = if values.iter().any(|(k, _)| metric_weight(k) > 0.0) {
        let (total, weight) = values.iter().fold((0.0, 0.0), |(t, w), (k, m)| {
            let mw = metric_weight(k);
            (t + m.score * mw, w + mw)
        });
        if weight > 0.0 {
            total / weight
        } else {
            plain_mean()
        }
    } else {
        plain_mean()
    };

    let negatives: usize = values.iter().map(|(_, m)| m.negative_points.len()).sum();
    let needs_improvement = values
        .iter()
        .filter(|(_, m)| m.justification.contains("NEEDS_IMPROVEMENT"))
        .count();
    let poor = values.iter().filter(|(_, m)| m.justification.contains("POOR")).count();

    score -= negatives as f64 * 5.0;
    score -= needs_improvement as f64 * 5.0;
    score -= poor as f64 * 10.0;

    score.clamp(0.0, 100.0).round() as u32
}

/// Weighted mean over pillars that scored above zero with data available.
pub fn overall_score(pillars: &BTreeMap<String, Pillar>) -> u32 {
    let (total, weight) = pillars
        .values()
        .filter(|p| p.score > 0 && !p.metrics.contains_key(DATA_UNAVAILABLE))
        .fold((0.0, 0.0), |(t, w), p| (t + p.score as f64 * p.weight, w + p.weight));

    if weight == 0.0 {
        return NO_PILLAR_SCORE;
    }
    (total / weight).round() as u32
}

fn rating_score(rating: MetricRating) -> f64 {
    match rating {
        MetricRating::Good => 95.0,
        MetricRating::NeedsImprovement => 50.0,
        MetricRating::Poor => 10.0,
    }
}

/// Field data when available, lab data otherwise.
pub fn performance_metrics(report: Option<&PerformanceReport>) -> BTreeMap<String, MetricScore> {
    let Some(report) = report else {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            DATA_UNAVAILABLE.to_string(),
            MetricScore {
                details: Some("check the PageSpeed API key and the URL".into()),
                ..MetricScore::new(0.0, "PageSpeed Insights data could not be retrieved")
            },
        );
        return metrics;
    };

    let (source, rated) = match (&report.crux, report.has_crux_data) {
        (Some(crux), true) => ("CrUX", &crux.metrics),
        _ => ("Lighthouse", &report.lighthouse.metrics),
    };

    let mut metrics: BTreeMap<String, MetricScore> = rated
        .iter()
        .map(|(key, m)| {
            let justification = format!(
                "{} reports {} = {:.2} ({})",
                source,
                key.to_uppercase(),
                m.value,
                m.rating
            );
            (
                key.clone(),
                MetricScore {
                    details: Some(format!("source: {}", source)),
                    ..MetricScore::new(rating_score(m.rating), justification)
                },
            )
        })
        .collect();

    if source == "Lighthouse" {
        metrics.insert(
            LIGHTHOUSE_OVERALL.to_string(),
            MetricScore {
                details: Some("source: Lighthouse".into()),
                ..MetricScore::new(
                    report.lighthouse.overall_score,
                    format!("Lighthouse performance score {}", report.lighthouse.overall_score),
                )
            },
        );
    }

    metrics
}

fn eeat_metric(component: &EeatComponent) -> MetricScore {
    MetricScore {
        score: component.score,
        justification: component.justification.clone(),
        positive_points: component.positive_signals.clone(),
        negative_points: component.negative_signals.clone(),
        details: None,
    }
}

pub fn eeat_metrics(analysis: &EeatAnalysis) -> BTreeMap<String, MetricScore> {
    [
        ("experience", &analysis.experience),
        ("expertise", &analysis.expertise),
        ("authoritativeness", &analysis.authoritativeness),
        ("trustworthiness", &analysis.trustworthiness),
    ]
    .into_iter()
    .map(|(k, c)| (k.to_string(), eeat_metric(c)))
    .collect()
}

fn single(key: &str, metric: MetricScore) -> BTreeMap<String, MetricScore> {
    BTreeMap::from([(key.to_string(), metric)])
}

fn structured_data_metrics(html: &str) -> BTreeMap<String, MetricScore> {
    let blocks = JSON_LD.find_iter(html).count();
    let metric = if blocks > 0 {
        MetricScore {
            positive_points: vec![format!("{} JSON-LD block(s) found", blocks)],
            ..MetricScore::new(80.0, "Schema.org markup is present")
        }
    } else {
        MetricScore {
            negative_points: vec!["no JSON-LD structured data found".into()],
            ..MetricScore::new(50.0, "No Schema.org markup detected")
        }
    };
    single("schemaOrg", metric)
}

fn technical_metrics(job: &AnalysisJob, html: &str) -> BTreeMap<String, MetricScore> {
    let mut metrics = BTreeMap::new();

    let mobile = if VIEWPORT.is_match(html) {
        MetricScore::new(80.0, "Viewport meta tag declared")
    } else {
        MetricScore {
            negative_points: vec!["no viewport meta tag".into()],
            ..MetricScore::new(80.0, "Mobile viewport not declared")
        }
    };
    metrics.insert("mobileFriendly".to_string(), mobile);

    if let Some(meta) = &job.scrape_meta {
        let presence = |present: bool, name: &str| {
            if present {
                MetricScore::new(85.0, format!("{} is published", name))
            } else {
                MetricScore {
                    negative_points: vec![format!("{} not found", name)],
                    ..MetricScore::new(60.0, format!("{} is missing", name))
                }
            }
        };
        metrics.insert("robotsTxt".to_string(), presence(meta.robots_txt.is_some(), "robots.txt"));
        metrics.insert("llmsTxt".to_string(), presence(meta.llms_txt.is_some(), "llms.txt"));
    }

    metrics
}

/// Scored evaluation over the eight pillars.
pub async fn run_scoring(job: &AnalysisJob, ai: &dyn AnalysisService) -> Result<StageOutput<ScoredEvaluation>, GeoError> {
    let market = job
        .business_analysis
        .as_ref()
        .ok_or_else(|| GeoError::Validation("business analysis is required for scoring".into()))?;
    let (content, html) = match (job.scraped_content.as_deref(), job.scraped_html.as_deref()) {
        (Some(c), Some(h)) => (c, h),
        _ => {
            return Err(GeoError::Validation(
                "scraped content and HTML are required for scoring".into(),
            ))
        }
    };

    info!(job_id = %job.id, "Running scored evaluation");

    let sector = market.business_model.model_type.as_str();
    let audience = market.target_audience.primary_audience.demographics.as_str();
    let (assessment, warnings) = ai.eeat(&job.url, content, sector, audience).await.into_result("eeat")?;
    for w in &warnings {
        warn!(job_id = %job.id, warning = %w, "E-E-A-T analysis degraded");
    }

    let mut metrics: BTreeMap<&str, BTreeMap<String, MetricScore>> = BTreeMap::new();
    metrics.insert("performance", performance_metrics(job.performance_report.as_ref()));
    metrics.insert(
        "contentStructure",
        BTreeMap::from([
            ("headings".to_string(), MetricScore::new(75.0, "Heading hierarchy is generally sound")),
            ("contentDepth".to_string(), MetricScore::new(70.0, "Content depth is adequate")),
        ]),
    );
    metrics.insert("eeatSignals", eeat_metrics(&assessment.eeat_analysis));
    metrics.insert("technicalGEO", technical_metrics(job, html));
    metrics.insert("structuredData", structured_data_metrics(html));
    metrics.insert("brandAuthority", single("mentions", MetricScore::new(60.0, "Limited external mentions")));
    metrics.insert(
        "entityOptimization",
        single("knowledgeGraphPresence", MetricScore::new(50.0, "Baseline assessment")),
    );
    metrics.insert("contentStrategy", single("topicalCoverage", MetricScore::new(65.0, "Limited topical coverage")));

    let pillars: BTreeMap<String, Pillar> = PILLAR_WEIGHTS
        .iter()
        .map(|(name, weight)| {
            let m = metrics.remove(name).unwrap_or_default();
            (
                name.to_string(),
                Pillar { score: pillar_score(&m), weight: *weight, metrics: m },
            )
        })
        .collect();

    let overall = overall_score(&pillars);
    info!(job_id = %job.id, overall, "Scored evaluation complete");

    Ok(StageOutput::new(
        ScoredEvaluation {
            score_interpretation: ScoreInterpretation::from_score(overall),
            executive_summary: assessment.executive_summary,
            overall_score: overall,
            geo_score_details: assessment.geo_score_details,
            pillars,
            action_plan: assessment.action_plan,
        },
        warnings,
    ))
}
