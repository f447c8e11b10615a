use super::helpers::mock_engine::{MockEngine, ScriptedOutcome};
use super::helpers::{create_harness, create_harness_no_worker};
use leadrs::domain::models::job::JobStatus;
use leadrs::domain::repositories::job_repository::JobRepository;
use leadrs::queue::job_queue::JobQueue;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_scheduler_redelivers_with_exponential_backoff() {
    tokio::time::pause();

    let harness = create_harness_no_worker(MockEngine::new(vec![])).await;
    let job_id = harness.submit(&["https://acme.io"]).await;

    // Attempt 1 fails, redelivery is due 2s later
    let first = harness.queue.dequeue().await.unwrap().unwrap();
    assert_eq!(first.attempt, 1);
    harness.queue.fail(job_id, "engine crashed").await.unwrap();
    assert!(harness.queue.dequeue().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert!(harness.queue.dequeue().await.unwrap().is_none());

    // Past the due time plus one sweep interval the message is back
    tokio::time::sleep(Duration::from_millis(600)).await;
    let second = harness.queue.dequeue().await.unwrap().unwrap();
    assert_eq!(second.attempt, 2);
    assert_eq!(second.job_id, job_id);

    // Attempt 2 fails, the delay doubles to 4s
    harness.queue.fail(job_id, "engine crashed").await.unwrap();
    tokio::time::sleep(Duration::from_millis(3999)).await;
    assert!(harness.queue.dequeue().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(600)).await;
    let third = harness.queue.dequeue().await.unwrap().unwrap();
    assert_eq!(third.attempt, 3);

    // Attempt 3 exhausts the budget, the message is dropped
    harness.queue.fail(job_id, "engine crashed").await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(harness.queue.dequeue().await.unwrap().is_none());
    assert_eq!(harness.queue.sweep(), 0);
}

#[tokio::test]
async fn test_worker_retries_until_message_is_dropped() {
    tokio::time::pause();

    let engine = MockEngine::new(vec![]).failing_first_initializations(u32::MAX);
    let harness = create_harness(engine).await;
    let job_id = harness.submit(&["https://acme.io"]).await;

    for _ in 0..400 {
        if harness.engine.initialize_calls.load(Ordering::SeqCst) >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // No fourth delivery after the attempt budget is spent
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.engine.initialize_calls.load(Ordering::SeqCst), 3);

    let job = harness.job_repo.find_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error_message
        .as_deref()
        .unwrap()
        .contains("chromium not found"));

    assert!(harness.queue.dequeue().await.unwrap().is_none());
}
