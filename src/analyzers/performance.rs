use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::PageSpeedSettings;
use crate::errors::GeoError;
use crate::models::{CruxData, LighthouseData, MetricRating, PerformanceReport, RatedMetric};

/// Measures page performance for a URL.
#[async_trait]
pub trait PerformanceProbe: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<PerformanceReport, GeoError>;
}

/// (good, poor) upper bounds per metric.
fn thresholds(metric: &str) -> Option<(f64, f64)> {
    match metric {
        "lcp" => Some((2500.0, 4000.0)),
        "inp" => Some((200.0, 500.0)),
        "cls" => Some((0.1, 0.25)),
        "fcp" => Some((1800.0, 3000.0)),
        "ttfb" => Some((800.0, 1800.0)),
        "speedIndex" => Some((3400.0, 5800.0)),
        "totalBlockingTime" => Some((200.0, 600.0)),
        "timeToInteractive" => Some((3800.0, 7300.0)),
        _ => None,
    }
}

pub fn rate(metric: &str, value: f64) -> MetricRating {
    match thresholds(metric) {
        Some((good, _)) if value <= good => MetricRating::Good,
        Some((_, poor)) if value > poor => MetricRating::Poor,
        _ => MetricRating::NeedsImprovement,
    }
}

const CRUX_KEYS: &[(&str, &str)] = &[
    ("LARGEST_CONTENTFUL_PAINT_MS", "lcp"),
    ("INTERACTION_TO_NEXT_PAINT", "inp"),
    ("CUMULATIVE_LAYOUT_SHIFT_SCORE", "cls"),
    ("FIRST_CONTENTFUL_PAINT_MS", "fcp"),
    // Closest field-data proxy PSI exposes.
    ("FIRST_INPUT_DELAY_MS", "ttfb"),
];

const LIGHTHOUSE_AUDITS: &[(&str, &str)] = &[
    ("largest-contentful-paint", "lcp"),
    ("cumulative-layout-shift", "cls"),
    ("first-contentful-paint", "fcp"),
    ("speed-index", "speedIndex"),
    ("total-blocking-time", "totalBlockingTime"),
    ("interactive", "timeToInteractive"),
];

fn number(v: &Value) -> Option<f64> {
    v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn parse_crux(data: &Value) -> Option<CruxData> {
    let record = data.get("loadingExperience")?;
    let raw = record.get("metrics")?.as_object()?;

    let mut metrics = BTreeMap::new();
    for (psi_key, key) in CRUX_KEYS {
        let Some(p75) = raw.get(*psi_key).and_then(|m| m.pointer("/percentiles/p75")).and_then(number) else {
            continue;
        };
        // PSI reports CLS p75 multiplied by 100.
        let value = if *key == "cls" { p75 / 100.0 } else { p75 };
        metrics.insert(key.to_string(), RatedMetric { value, rating: rate(key, value) });
    }

    if !["lcp", "inp", "cls"].iter().all(|k| metrics.contains_key(*k)) {
        debug!("CrUX core metrics missing");
        return None;
    }

    let overall_rating = match record.get("overall_category").and_then(Value::as_str) {
        Some("FAST") | Some("GOOD") => MetricRating::Good,
        Some("SLOW") | Some("POOR") => MetricRating::Poor,
        _ => MetricRating::NeedsImprovement,
    };

    Some(CruxData { overall_rating, metrics })
}

fn parse_lighthouse(data: &Value) -> Result<LighthouseData, GeoError> {
    let lighthouse = data
        .get("lighthouseResult")
        .ok_or_else(|| GeoError::Analysis("PageSpeed response has no Lighthouse result".into()))?;
    let audits = lighthouse
        .get("audits")
        .ok_or_else(|| GeoError::Analysis("PageSpeed response has no Lighthouse audits".into()))?;

    let metrics = LIGHTHOUSE_AUDITS
        .iter()
        .map(|(audit, key)| {
            let value = audits
                .get(*audit)
                .and_then(|a| a.get("numericValue"))
                .and_then(number)
                .unwrap_or(0.0);
            (key.to_string(), RatedMetric { value, rating: rate(key, value) })
        })
        .collect();

    let overall_score = lighthouse
        .pointer("/categories/performance/score")
        .and_then(number)
        .unwrap_or(0.0)
        * 100.0;

    Ok(LighthouseData { overall_score, metrics })
}

/// Build a report from a PageSpeed Insights v5 response body.
pub fn parse_psi_response(url: &str, data: &Value) -> Result<PerformanceReport, GeoError> {
    let crux = parse_crux(data);
    let lighthouse = parse_lighthouse(data)?;
    Ok(PerformanceReport {
        url: url.to_string(),
        has_crux_data: crux.is_some(),
        crux,
        lighthouse,
    })
}

/// Google PageSpeed Insights client.
pub struct PageSpeedClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    strategy: String,
    timeout: Duration,
}

impl PageSpeedClient {
    pub fn new(settings: &PageSpeedSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            strategy: settings.strategy.clone(),
            timeout: settings.timeout,
        }
    }
}

#[async_trait]
impl PerformanceProbe for PageSpeedClient {
    async fn analyze(&self, url: &str) -> Result<PerformanceReport, GeoError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GeoError::Config("GOOGLE_PAGESPEED_API_KEY is not set".into()))?;

        info!(url, strategy = %self.strategy, "Running PageSpeed Insights");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("url", url),
                ("category", "PERFORMANCE"),
                ("strategy", self.strategy.as_str()),
                ("key", api_key),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GeoError::transport("PageSpeed", e))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| GeoError::Analysis(format!("PageSpeed returned an unreadable body: {}", e.without_url())))?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(GeoError::Analysis(format!("PageSpeed API error: {}", message)));
        }

        let report = parse_psi_response(url, &body)?;
        info!(url, has_crux = report.has_crux_data, "PageSpeed analysis complete");
        Ok(report)
    }
}
