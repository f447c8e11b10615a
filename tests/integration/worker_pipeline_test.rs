// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_harness;
use super::helpers::mock_engine::{MockEngine, ScriptedOutcome};
use leadrs::domain::models::job::JobStatus;
use leadrs::domain::repositories::lead_repository::LeadRepository;
use leadrs::queue::job_queue::{JobQueue, QueueError};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_job_with_mixed_results_completes() {
    let engine = MockEngine::new(vec![
        (
            "https://acme.io",
            ScriptedOutcome::Lead {
                lead_score: 85,
                confidence: 90,
            },
        ),
        (
            "https://initech.com",
            ScriptedOutcome::Lead {
                lead_score: 45,
                confidence: 60,
            },
        ),
        (
            "https://unreachable.example",
            ScriptedOutcome::NavigationError("net::ERR_NAME_NOT_RESOLVED"),
        ),
        (
            "https://hooli.com",
            ScriptedOutcome::Lead {
                lead_score: 20,
                confidence: 40,
            },
        ),
        ("https://slow.example", ScriptedOutcome::Timeout),
    ]);
    let harness = create_harness(engine).await;

    let job_id = harness
        .submit(&[
            "https://acme.io",
            "https://initech.com",
            "https://unreachable.example",
            "https://hooli.com",
            "https://slow.example",
        ])
        .await;
    let job = harness.wait_for_terminal_job(job_id).await;

    // Per-URL failures do not fail the job
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed, 3);
    assert_eq!(job.failed, 2);
    assert!(job.error_message.is_none());

    // Results follow submission order, one entry per URL
    assert_eq!(job.results.len(), 5);
    assert_eq!(job.results[0].url, "https://acme.io");
    assert_eq!(job.results[0].lead_score, 85);
    assert!(job.results[2].is_failure());
    assert!(job.results[4].is_failure());
    assert!(job.results[2]
        .error
        .as_deref()
        .unwrap()
        .contains("net::ERR_NAME_NOT_RESOLVED"));

    // Only successful scrapes become leads
    let leads = harness.lead_repo.leads_for_job(job_id).await.unwrap();
    let lead_urls: Vec<&str> = leads.iter().map(|lead| lead.url.as_str()).collect();
    assert_eq!(
        lead_urls,
        vec!["https://acme.io", "https://initech.com", "https://hooli.com"]
    );

    // The worker acknowledged the message
    assert!(matches!(
        harness.queue.complete(job_id).await,
        Err(QueueError::NotFound)
    ));
}

#[tokio::test]
async fn test_job_where_every_url_fails_still_completes() {
    let engine = MockEngine::new(vec![
        (
            "https://a.example",
            ScriptedOutcome::NavigationError("net::ERR_CONNECTION_REFUSED"),
        ),
        ("https://b.example", ScriptedOutcome::Timeout),
    ]);
    let harness = create_harness(engine).await;

    let job_id = harness
        .submit(&["https://a.example", "https://b.example"])
        .await;
    let job = harness.wait_for_terminal_job(job_id).await;

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed, 0);
    assert_eq!(job.failed, 2);
    assert!(job.results.iter().all(|record| record.is_failure()));
    assert!(harness.lead_repo.leads_for_job(job_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_engine_lifecycle_spans_exactly_one_job() {
    let engine = MockEngine::new(vec![
        (
            "https://acme.io",
            ScriptedOutcome::Lead {
                lead_score: 50,
                confidence: 70,
            },
        ),
        (
            "https://initech.com",
            ScriptedOutcome::Lead {
                lead_score: 30,
                confidence: 50,
            },
        ),
    ]);
    let harness = create_harness(engine).await;

    let first = harness.submit(&["https://acme.io"]).await;
    harness.wait_for_terminal_job(first).await;

    let second = harness.submit(&["https://initech.com"]).await;
    harness.wait_for_terminal_job(second).await;

    // One initialize and one close per processed job
    assert_eq!(harness.engine.initialize_calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.engine.close_calls.load(Ordering::SeqCst), 2);

    let scraped = harness.engine.scraped_urls.lock().unwrap().clone();
    assert_eq!(scraped, vec!["https://acme.io", "https://initech.com"]);
}
