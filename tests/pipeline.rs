mod common;

use std::sync::Arc;

use common::*;
use geoscope::errors::GeoError;
use geoscope::models::{EventStatus, JobStatus};
use geoscope::store::JobStore;
use tokio_util::sync::CancellationToken;

fn steps(events: &[geoscope::models::JobEvent]) -> Vec<(String, EventStatus)> {
    events.iter().map(|e| (e.step.clone(), e.status)).collect()
}

#[tokio::test]
async fn test_happy_path_completes_with_every_report() {
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Page), FakeAi::default());
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let done = services.orchestrator().run(&job.id).await.unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.error.is_none());
    assert!(done.scraped_html.is_some());
    assert!(done.scraped_content.is_some());
    assert!(done.scrape_meta.is_some());
    assert!(done.performance_report.is_some());
    assert!(done.business_analysis.is_some());
    assert!(done.scored_evaluation.is_some());
    assert!(done.strategic_agenda.is_some());
    assert!(done.enhanced_analysis.is_some());
    let score = done.final_score.unwrap();
    assert!(score <= 100);
    assert_eq!(score, done.scored_evaluation.as_ref().unwrap().overall_score);

    let generative = done.generative_performance_report.unwrap();
    assert_eq!(generative.share_of_generative_voice.mentions, 2);
    assert_eq!(generative.citation_analysis.top_cited_urls, vec!["https://example.com/docs".to_string()]);
    assert_eq!(generative.accuracy_and_hallucination.accuracy_score, 100);

    let events = store.events(&job.id).await.unwrap();
    let log = steps(&events);
    assert_eq!(log.first(), Some(&("INIT".to_string(), EventStatus::Started)));
    for step in ["INIT", "FETCH", "PERFORMANCE", "MARKET", "SCORING", "AGENDA", "GENERATIVE", "ENHANCED"] {
        assert!(log.contains(&(step.to_string(), EventStatus::Started)), "{step} started");
        assert!(log.contains(&(step.to_string(), EventStatus::Completed)), "{step} completed");
    }
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let fetch_done = events
        .iter()
        .find(|e| e.step == "FETCH" && e.status == EventStatus::Completed)
        .unwrap();
    assert_eq!(fetch_done.detail.as_ref().unwrap()["via"], "primary");
}

#[tokio::test]
async fn test_fetch_failure_ends_job_without_stage_results() {
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Scraping), FakeAi::default());
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let done = services.orchestrator().run(&job.id).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.as_deref().unwrap().starts_with("fetch_failed:"));
    assert!(done.scraped_html.is_none());
    assert!(done.performance_report.is_none());
    assert!(done.business_analysis.is_none());
    assert!(done.final_score.is_none());

    let events = store.events(&job.id).await.unwrap();
    let last = events.last().unwrap();
    assert_eq!((last.step.as_str(), last.status), ("FETCH", EventStatus::Failed));
    assert_eq!(last.detail.as_ref().unwrap()["errorType"], "ScrapingError");
}

#[tokio::test]
async fn test_dns_failure_mentions_dns() {
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Dns), FakeAi::default());
    let job = queued_job(store.as_ref(), "https://nonexistent.invalid").await;

    let done = services.orchestrator().run(&job.id).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    let error = done.error.unwrap();
    assert!(error.starts_with("fetch_failed:"));
    assert!(error.contains("DNS"), "{error}");
}

#[tokio::test]
async fn test_market_failure_keeps_earlier_results() {
    let ai = FakeAi { fail_business_model: true, ..Default::default() };
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Page), ai);
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let err = services.orchestrator().run(&job.id).await.unwrap_err();
    match &err {
        GeoError::Orchestration { job_id, error_type, .. } => {
            assert_eq!(job_id, &job.id);
            assert_eq!(*error_type, "AnalysisError");
        }
        other => panic!("unexpected error: {other}"),
    }

    let stored = store.get(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.error.as_deref().unwrap().contains("market analysis"));
    assert!(stored.scraped_html.is_some());
    assert!(stored.performance_report.is_some());
    assert!(stored.business_analysis.is_none());
    assert!(stored.scored_evaluation.is_none());

    let events = store.events(&job.id).await.unwrap();
    let last = events.last().unwrap();
    assert_eq!((last.step.as_str(), last.status), ("MARKET", EventStatus::Failed));
}

#[tokio::test]
async fn test_failing_narrative_still_completes() {
    let ai = FakeAi { fail_narrative: true, ..Default::default() };
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Page), ai);
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let done = services.orchestrator().run(&job.id).await.unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.enhanced_analysis.is_none());
    assert!(done.final_score.is_some());
    let events = store.events(&job.id).await.unwrap();
    assert!(events.iter().any(|e| e.step == "ENHANCED" && e.status == EventStatus::Failed));
}

#[tokio::test]
async fn test_cancelled_between_stages() {
    let token = CancellationToken::new();
    let mut fetcher = FakeFetcher::new(FetchBehavior::Page);
    fetcher.cancel_on_fetch = Some(token.clone());
    let (services, store) = services(fetcher, FakeAi::default());
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let err = services
        .orchestrator()
        .with_cancel_token(token)
        .run(&job.id)
        .await
        .unwrap_err();
    assert_eq!(err.classify().error_type, "CancelledError");

    let stored = store.get(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.error.as_deref(), Some("cancelled"));
    assert!(stored.scraped_html.is_some());
    assert!(stored.performance_report.is_none());
}

#[tokio::test]
async fn test_terminal_job_is_not_rerun() {
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Page), FakeAi::default());
    let job = queued_job(store.as_ref(), "https://example.com").await;
    services.orchestrator().run(&job.id).await.unwrap();
    let before = store.events(&job.id).await.unwrap().len();

    let err = services.orchestrator().run(&job.id).await.unwrap_err();
    assert!(matches!(err, GeoError::Conflict(_)));
    assert_eq!(store.events(&job.id).await.unwrap().len(), before);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let (services, _store) = services(FakeFetcher::new(FetchBehavior::Page), FakeAi::default());
    let err = services.orchestrator().run("missing").await.unwrap_err();
    assert!(matches!(err, GeoError::NotFound(_)));
}

#[tokio::test]
async fn test_event_log_outage_does_not_abort_run() {
    let store = Arc::new(RecordingStore::rejecting_events());
    let services = services_with_store(FakeFetcher::new(FetchBehavior::Page), FakeAi::default(), store.clone());
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let done = services.orchestrator().run(&job.id).await.unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.generative_performance_report.is_some());
    assert!(store.events(&job.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persisted_status_only_moves_forward() {
    let store = Arc::new(RecordingStore::default());
    let services = services_with_store(FakeFetcher::new(FetchBehavior::Page), FakeAi::default(), store.clone());
    let job = queued_job(store.as_ref(), "https://example.com").await;

    services.orchestrator().run(&job.id).await.unwrap();

    let mut seen = store.statuses();
    assert!(seen.windows(2).all(|w| w[0].can_advance_to(w[1])));
    seen.dedup();
    assert_eq!(
        seen,
        vec![
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::ProcessingFetch,
            JobStatus::ProcessingPerformance,
            JobStatus::ProcessingMarket,
            JobStatus::ProcessingScoring,
            JobStatus::ProcessingAgenda,
            JobStatus::ProcessingGenerative,
            JobStatus::Completed,
        ]
    );
}

#[tokio::test]
async fn test_seed_queries_are_answered_concurrently() {
    // Two seed queries; neither answer returns until both are in flight.
    let ai = FakeAi {
        query_barrier: Some(Arc::new(tokio::sync::Barrier::new(2))),
        ..Default::default()
    };
    let (services, store) = services(FakeFetcher::new(FetchBehavior::Page), ai);
    let job = queued_job(store.as_ref(), "https://example.com").await;

    let done = tokio::time::timeout(std::time::Duration::from_secs(5), services.orchestrator().run(&job.id))
        .await
        .expect("seed queries ran one at a time")
        .unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    let generative = done.generative_performance_report.unwrap();
    assert_eq!(generative.share_of_generative_voice.mentions, 2);
}
