use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::report::{
    GenerativeReport, MarketReport, PerformanceReport, ScoredEvaluation, StrategicAgenda,
};
use crate::errors::GeoError;

/// Lifecycle of an analysis job. Variants are declared in progression order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    ProcessingFetch,
    ProcessingPerformance,
    ProcessingMarket,
    ProcessingScoring,
    ProcessingAgenda,
    ProcessingGenerative,
    Completed,
    Failed,
}

impl JobStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Processing => 1,
            Self::ProcessingFetch => 2,
            Self::ProcessingPerformance => 3,
            Self::ProcessingMarket => 4,
            Self::ProcessingScoring => 5,
            Self::ProcessingAgenda => 6,
            Self::ProcessingGenerative => 7,
            Self::Completed => 8,
            Self::Failed => 9,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a job in `self` may be moved to `next`.
    ///
    /// Statuses only move forward. Re-asserting the current status is allowed,
    /// `FAILED` is reachable from any non-terminal state and terminal states
    /// accept nothing.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed {
            return true;
        }
        next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::ProcessingFetch => "PROCESSING_FETCH",
            Self::ProcessingPerformance => "PROCESSING_PERFORMANCE",
            Self::ProcessingMarket => "PROCESSING_MARKET",
            Self::ProcessingScoring => "PROCESSING_SCORING",
            Self::ProcessingAgenda => "PROCESSING_AGENDA",
            Self::ProcessingGenerative => "PROCESSING_GENERATIVE",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Started,
    Completed,
    Failed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// One entry of a job's append-only progress log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobEvent {
    pub step: String,
    pub status: EventStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl JobEvent {
    pub fn new(step: impl Into<String>, status: EventStatus) -> Self {
        Self {
            step: step.into(),
            status,
            timestamp: Utc::now(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Which acquisition path produced the page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetchVia {
    Primary,
    Fallback,
}

impl std::fmt::Display for FetchVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Side data gathered alongside the page body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots_txt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llms_txt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Value>,
    pub via: FetchVia,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_meta: Option<ScrapeMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_report: Option<PerformanceReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_analysis: Option<MarketReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scored_evaluation: Option<ScoredEvaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_agenda: Option<StrategicAgenda>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generative_performance_report: Option<GenerativeReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_analysis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub events: Vec<JobEvent>,
}

impl AnalysisJob {
    /// A fresh `QUEUED` job for an already-normalized URL.
    pub fn new(id: impl Into<String>, url: impl Into<String>, user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            url: url.into(),
            user_id,
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            scraped_html: None,
            scraped_content: None,
            scrape_meta: None,
            performance_report: None,
            business_analysis: None,
            scored_evaluation: None,
            strategic_agenda: None,
            generative_performance_report: None,
            enhanced_analysis: None,
            final_score: None,
            error: None,
            events: Vec::new(),
        }
    }

    /// Merge the fields set in `patch` into this job and restamp `updated_at`.
    ///
    /// Fields absent from the patch are left untouched. A status that would
    /// regress, or a second write to a stage result, is rejected and leaves
    /// the job unchanged.
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), GeoError> {
        if let Some(next) = patch.status {
            if next != self.status && !self.status.can_advance_to(next) {
                return Err(GeoError::Conflict(format!(
                    "job {} cannot move from {} to {}",
                    self.id, self.status, next
                )));
            }
            if next == self.status && self.status.is_terminal() {
                return Err(GeoError::Conflict(format!(
                    "job {} is already {}",
                    self.id, self.status
                )));
            }
        }

        let write_once = [
            ("scrapedHtml", patch.scraped_html.is_some(), self.scraped_html.is_some()),
            ("scrapedContent", patch.scraped_content.is_some(), self.scraped_content.is_some()),
            ("scrapeMeta", patch.scrape_meta.is_some(), self.scrape_meta.is_some()),
            ("performanceReport", patch.performance_report.is_some(), self.performance_report.is_some()),
            ("businessAnalysis", patch.business_analysis.is_some(), self.business_analysis.is_some()),
            ("scoredEvaluation", patch.scored_evaluation.is_some(), self.scored_evaluation.is_some()),
            ("strategicAgenda", patch.strategic_agenda.is_some(), self.strategic_agenda.is_some()),
            (
                "generativePerformanceReport",
                patch.generative_performance_report.is_some(),
                self.generative_performance_report.is_some(),
            ),
            ("finalScore", patch.final_score.is_some(), self.final_score.is_some()),
        ];
        if let Some((field, _, _)) = write_once.iter().find(|(_, incoming, present)| *incoming && *present) {
            return Err(GeoError::Conflict(format!(
                "job {} already has {field}",
                self.id
            )));
        }

        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.scraped_html {
            self.scraped_html = Some(v);
        }
        if let Some(v) = patch.scraped_content {
            self.scraped_content = Some(v);
        }
        if let Some(v) = patch.scrape_meta {
            self.scrape_meta = Some(v);
        }
        if let Some(v) = patch.performance_report {
            self.performance_report = Some(v);
        }
        if let Some(v) = patch.business_analysis {
            self.business_analysis = Some(v);
        }
        if let Some(v) = patch.scored_evaluation {
            self.scored_evaluation = Some(v);
        }
        if let Some(v) = patch.strategic_agenda {
            self.strategic_agenda = Some(v);
        }
        if let Some(v) = patch.generative_performance_report {
            self.generative_performance_report = Some(v);
        }
        if let Some(v) = patch.enhanced_analysis {
            self.enhanced_analysis = Some(v);
        }
        if let Some(v) = patch.final_score {
            self.final_score = Some(v);
        }
        if let Some(v) = patch.error {
            self.error = Some(v);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Hostname of the job URL, if it parses.
    pub fn hostname(&self) -> Option<String> {
        crate::fetch::url::hostname(&self.url)
    }
}

/// Listing row for a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub url: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AnalysisJob> for JobSummary {
    fn from(job: &AnalysisJob) -> Self {
        Self {
            id: job.id.clone(),
            url: job.url.clone(),
            status: job.status,
            final_score: job.final_score,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Partial update of an [`AnalysisJob`]. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_meta: Option<ScrapeMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_report: Option<PerformanceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_analysis: Option<MarketReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scored_evaluation: Option<ScoredEvaluation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategic_agenda: Option<StrategicAgenda>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generative_performance_report: Option<GenerativeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}
