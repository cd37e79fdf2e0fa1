//! In-process stand-ins for the fetcher, PageSpeed and the language models.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use geoscope::analyzers::{AnalysisService, PerformanceProbe};
use geoscope::app::Services;
use geoscope::errors::GeoError;
use geoscope::fetch::{ContentFetcher, FetchedPage};
use geoscope::llm::ProviderOutcome;
use geoscope::models::*;
use geoscope::store::{JobStore, MemoryJobStore};

pub const PAGE_TEXT: &str = "Example Domain. This domain is for use in illustrative examples in documents. \
    You may use this domain in literature without prior coordination or asking for permission.";

pub const PAGE_HTML: &str = r#"<html><head><meta name="viewport" content="width=device-width">
<script type="application/ld+json">{"@type":"Organization"}</script></head>
<body><h1>Example Domain</h1></body></html>"#;

pub enum FetchBehavior {
    Page,
    Dns,
    Scraping,
    /// Never returns.
    Hang,
}

pub struct FakeFetcher {
    pub behavior: FetchBehavior,
    pub calls: AtomicUsize,
    /// Cancelled as soon as the fetch runs.
    pub cancel_on_fetch: Option<CancellationToken>,
}

impl FakeFetcher {
    pub fn new(behavior: FetchBehavior) -> Self {
        Self { behavior, calls: AtomicUsize::new(0), cancel_on_fetch: None }
    }
}

#[async_trait]
impl ContentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }
        match self.behavior {
            FetchBehavior::Page => Ok(FetchedPage {
                html: PAGE_HTML.to_string(),
                content: PAGE_TEXT.to_string(),
                robots_txt: Some("User-agent: *\nAllow: /".to_string()),
                llms_txt: None,
                performance: None,
                via: FetchVia::Primary,
            }),
            FetchBehavior::Dns => Err(GeoError::DnsResolution(
                geoscope::fetch::url::hostname(url).unwrap_or_default(),
            )),
            FetchBehavior::Scraping => Err(GeoError::Scraping("net::ERR_CONNECTION_RESET".into())),
            FetchBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

pub struct FakeProbe;

#[async_trait]
impl PerformanceProbe for FakeProbe {
    async fn analyze(&self, url: &str) -> Result<PerformanceReport, GeoError> {
        let metrics = BTreeMap::from([
            ("lcp".to_string(), RatedMetric { value: 1800.0, rating: MetricRating::Good }),
            ("cls".to_string(), RatedMetric { value: 0.05, rating: MetricRating::Good }),
        ]);
        Ok(PerformanceReport {
            url: url.to_string(),
            has_crux_data: false,
            crux: None,
            lighthouse: LighthouseData { overall_score: 0.92, metrics },
        })
    }
}

fn ok<T>(data: T) -> ProviderOutcome<T> {
    ProviderOutcome::Ok { data, provider: "fake".to_string() }
}

fn failed<T>(why: &str) -> ProviderOutcome<T> {
    ProviderOutcome::AllFailed { errors: vec![format!("fake: {why}")] }
}

fn component(score: f64) -> Value {
    json!({ "score": score, "justification": "observed", "positiveSignals": ["author bios"] })
}

#[derive(Default)]
pub struct FakeAi {
    pub fail_business_model: bool,
    pub fail_narrative: bool,
    pub narrative_calls: AtomicUsize,
    /// When set, every seed query waits here before answering.
    pub query_barrier: Option<Arc<tokio::sync::Barrier>>,
}

#[async_trait]
impl AnalysisService for FakeAi {
    async fn business_model(&self, _url: &str, _content: &str) -> ProviderOutcome<BusinessModel> {
        if self.fail_business_model {
            return failed("upstream 500");
        }
        ok(BusinessModel {
            brand_name: Some("Example".to_string()),
            model_type: "Publisher".to_string(),
            confidence: 80.0,
            justification: "reference content".to_string(),
            key_revenue_streams: vec![],
        })
    }

    async fn target_audience(&self, _url: &str, _content: &str) -> ProviderOutcome<TargetAudience> {
        ok(TargetAudience {
            primary_audience: AudienceSegment {
                demographics: "developers".to_string(),
                psychographics: "pragmatic".to_string(),
            },
            secondary_audiences: vec![],
            confidence: 70.0,
            justification: "documentation tone".to_string(),
        })
    }

    async fn competitors(&self, _url: &str, _content: &str) -> ProviderOutcome<CompetitorAnalysis> {
        ok(CompetitorAnalysis {
            business_competitors: vec![BusinessCompetitor {
                name: "Sample Org".to_string(),
                url: "https://sample.org".to_string(),
                reason: "same niche".to_string(),
            }],
            content_competitors: vec![],
            summary: "few".to_string(),
            confidence: 60.0,
        })
    }

    async fn eeat(&self, _url: &str, _content: &str, _sector: &str, _audience: &str) -> ProviderOutcome<EeatAssessment> {
        let assessment = serde_json::from_value(json!({
            "eeatAnalysis": {
                "experience": component(70.0),
                "expertise": component(75.0),
                "authoritativeness": component(65.0),
                "trustworthiness": component(80.0),
                "overallScore": 72
            },
            "executiveSummary": "Solid foundations.",
            "actionPlan": [{ "priority": "high", "description": "Add FAQ schema", "category": "structuredData" }]
        }));
        match assessment {
            Ok(a) => ok(a),
            Err(e) => failed(&e.to_string()),
        }
    }

    async fn agenda(&self, _url: &str, _evaluation: &ScoredEvaluation) -> ProviderOutcome<StrategicAgenda> {
        ok(StrategicAgenda {
            session_focus: "Entity clarity".to_string(),
            strategic_goals: vec!["Be cited".to_string()],
            customized_questions: vec![],
        })
    }

    async fn answer_query(&self, _query: &str) -> ProviderOutcome<String> {
        if let Some(barrier) = &self.query_barrier {
            barrier.wait().await;
        }
        ok("Example is documented at https://example.com/docs and compared with Sample Org.".to_string())
    }

    async fn sentiment(&self, _brand: &str, _text: &str) -> ProviderOutcome<Value> {
        ok(json!({ "positive": 60, "neutral": 30, "negative": 10 }))
    }

    async fn extract_claims(&self, _brand: &str, _text: &str) -> ProviderOutcome<Vec<String>> {
        ok(vec!["Example is for illustrative use".to_string()])
    }

    async fn verify_claims(&self, claims: &[String], _context: &str) -> ProviderOutcome<Vec<ClaimVerification>> {
        ok(claims
            .iter()
            .map(|c| ClaimVerification {
                claim: c.clone(),
                source_text: "illustrative examples".to_string(),
                verification_result: VerificationResult::Verified,
                explanation: "stated on page".to_string(),
            })
            .collect())
    }

    async fn enhanced_narrative(&self, _job: &AnalysisJob) -> ProviderOutcome<Value> {
        self.narrative_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_narrative {
            return failed("timeout");
        }
        ok(json!({ "headline": "Visible but thin" }))
    }
}

pub fn services(fetcher: FakeFetcher, ai: FakeAi) -> (Services, Arc<MemoryJobStore>) {
    let store = Arc::new(MemoryJobStore::new());
    (services_with_store(fetcher, ai, store.clone()), store)
}

pub fn services_with_store(fetcher: FakeFetcher, ai: FakeAi, store: Arc<dyn JobStore>) -> Services {
    Services {
        store,
        fetcher: Arc::new(fetcher),
        performance: Arc::new(FakeProbe),
        ai: Arc::new(ai),
        seed_queries: vec!["what is {brand}".to_string(), "best alternatives to {brand}".to_string()],
    }
}

/// Memory store that remembers every persisted status and can refuse events.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryJobStore,
    pub statuses: Mutex<Vec<JobStatus>>,
    pub reject_events: bool,
}

impl RecordingStore {
    pub fn rejecting_events() -> Self {
        Self { reject_events: true, ..Default::default() }
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn get(&self, id: &str) -> Result<Option<AnalysisJob>, GeoError> {
        self.inner.get(id).await
    }

    async fn create(&self, job: &AnalysisJob) -> Result<(), GeoError> {
        self.inner.create(job).await?;
        self.statuses.lock().unwrap().push(job.status);
        Ok(())
    }

    async fn update(&self, id: &str, patch: JobPatch) -> Result<AnalysisJob, GeoError> {
        let job = self.inner.update(id, patch).await?;
        self.statuses.lock().unwrap().push(job.status);
        Ok(job)
    }

    async fn append_event(&self, id: &str, event: JobEvent) -> Result<(), GeoError> {
        if self.reject_events {
            return Err(GeoError::Database("event log unavailable".into()));
        }
        self.inner.append_event(id, event).await
    }

    async fn events(&self, id: &str) -> Result<Vec<JobEvent>, GeoError> {
        self.inner.events(id).await
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<JobSummary>, GeoError> {
        self.inner.list(limit, offset).await
    }
}

pub async fn queued_job(store: &dyn JobStore, url: &str) -> AnalysisJob {
    let job = AnalysisJob::new(uuid::Uuid::new_v4().to_string(), url, None);
    store.create(&job).await.unwrap();
    job
}
