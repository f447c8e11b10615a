// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 完整工作流端到端测试
///
/// 测试从提交作业到获取评分线索的完整流程
/// 验证系统的核心功能是否正常集成和工作
use crate::integration::helpers::create_harness;
use crate::integration::helpers::mock_engine::{MockEngine, ScriptedOutcome};
use leadrs::domain::models::job::JobStatus;
use leadrs::domain::models::scraped_record::Priority;
use leadrs::domain::repositories::job_repository::JobRepository;
use leadrs::domain::repositories::lead_repository::LeadRepository;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_complete_scrape_workflow() {
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
                lead_score: 55,
                confidence: 70,
            },
        ),
        (
            "https://hooli.com",
            ScriptedOutcome::Lead {
                lead_score: 15,
                confidence: 30,
            },
        ),
    ]);
    let harness = create_harness(engine).await;

    // Step 1: Submit a batch of company websites
    let job_id = harness
        .submit(&["https://acme.io", "https://initech.com", "https://hooli.com"])
        .await;

    // Step 2: The worker drains the job to completion
    let job = harness.wait_for_terminal_job(job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.completed, 3);
    assert_eq!(job.failed, 0);

    // Step 3: Scored leads are available, prioritised by score
    let leads = harness.lead_repo.leads_for_job(job_id).await.unwrap();
    assert_eq!(leads.len(), 3);
    assert_eq!(leads[0].priority, Priority::High);
    assert_eq!(leads[1].priority, Priority::Medium);
    assert_eq!(leads[2].priority, Priority::Low);
}

#[tokio::test]
async fn test_transient_launch_failure_recovers_on_redelivery() {
    tokio::time::pause();

    // The first browser launch fails, the redelivered attempt succeeds
    let engine = MockEngine::new(vec![(
        "https://acme.io",
        ScriptedOutcome::Lead {
            lead_score: 85,
            confidence: 90,
        },
    )])
    .failing_first_initializations(1);
    let harness = create_harness(engine).await;

    let job_id = harness.submit(&["https://acme.io"]).await;

    let mut completed = None;
    for _ in 0..400 {
        if let Some(job) = harness.job_repo.find_job(job_id).await.unwrap() {
            if job.status == JobStatus::Completed {
                completed = Some(job);
                break;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }

    // The second delivery overwrote the failed record
    let job = completed.expect("job never completed after redelivery");
    assert_eq!(job.completed, 1);
    assert!(job.error_message.is_none());
    assert_eq!(harness.engine.initialize_calls.load(Ordering::SeqCst), 2);

    // The engine is closed after failed and successful attempts alike
    assert_eq!(harness.engine.close_calls.load(Ordering::SeqCst), 2);

    let leads = harness.lead_repo.leads_for_job(job_id).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].url, "https://acme.io");
}
