// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::settings::WorkerSettings;
use crate::domain::models::job::{Job, JobStatus};
use crate::domain::models::scraped_record::ScrapedRecord;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::engines::traits::ScraperEngine;
use crate::queue::job_queue::{JobQueue, QueuedJob};
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;

/// 抓取工作器
///
/// 从队列拉取作业，逐个URL驱动引擎抓取，并在每个URL处理后
/// 落盘线索与进度。作业级异常（引擎初始化失败等）使作业进入
/// FAILED终态并触发队列重投递，已抓到的部分结果保留。
pub struct ScrapeWorker<Q, J, L, E>
where
    Q: JobQueue,
    J: JobRepository,
    L: LeadRepository,
    E: ScraperEngine,
{
    queue: Arc<Q>,
    job_repository: Arc<J>,
    lead_repository: Arc<L>,
    engine: Arc<E>,
    poll_interval: Duration,
    worker_name: String,
}

impl<Q, J, L, E> ScrapeWorker<Q, J, L, E>
where
    Q: JobQueue,
    J: JobRepository,
    L: LeadRepository,
    E: ScraperEngine,
{
    /// 创建新的抓取工作器实例
    ///
    /// # 参数
    ///
    /// * `queue` - 作业队列
    /// * `job_repository` - 作业仓库
    /// * `lead_repository` - 线索仓库
    /// * `engine` - 抓取引擎（每个工作器独立实例）
    /// * `settings` - Worker配置
    /// * `worker_name` - 工作器名称
    pub fn new(
        queue: Arc<Q>,
        job_repository: Arc<J>,
        lead_repository: Arc<L>,
        engine: Arc<E>,
        settings: &WorkerSettings,
        worker_name: String,
    ) -> Self {
        Self {
            queue,
            job_repository,
            lead_repository,
            engine,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            worker_name,
        }
    }

    /// 处理一个队列消息的完整生命周期
    ///
    /// 重投递的消息会以全新的PROCESSING作业记录覆盖之前的终态
    #[instrument(
        skip(self, queued),
        fields(
            job_id = %queued.job_id,
            user_id = %queued.submission.user_id,
            url_count = queued.submission.urls.len()
        )
    )]
    async fn process_job(&self, queued: QueuedJob) -> Result<(), WorkerError> {
        info!("Processing job (attempt {})", queued.attempt);

        let job = Job::new(
            queued.job_id,
            queued.submission.user_id.clone(),
            queued.submission.urls.clone(),
        )
        .start()
        .map_err(|e| WorkerError::DomainError(e.to_string()))?;
        let mut job = self
            .job_repository
            .upsert_job(&job)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;

        match self.execute_job(&mut job).await {
            Ok(()) => {
                let done = job
                    .complete()
                    .map_err(|e| WorkerError::DomainError(e.to_string()))?;
                self.job_repository
                    .finalize_job(done.id, JobStatus::Completed, done.results.clone(), None)
                    .await
                    .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
                self.queue
                    .complete(done.id)
                    .await
                    .map_err(|e| WorkerError::QueueError(e.to_string()))?;
                counter!("worker_jobs_completed_total").increment(1);
                info!(
                    "Job completed: {} succeeded, {} failed",
                    done.completed, done.failed
                );
            }
            Err(error) => {
                let message = error.to_string();
                let failed = job
                    .fail(message.clone())
                    .map_err(|e| WorkerError::DomainError(e.to_string()))?;
                self.job_repository
                    .finalize_job(
                        failed.id,
                        JobStatus::Failed,
                        failed.results.clone(),
                        Some(message.clone()),
                    )
                    .await
                    .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
                self.queue
                    .fail(failed.id, &message)
                    .await
                    .map_err(|e| WorkerError::QueueError(e.to_string()))?;
                counter!("worker_jobs_failed_total").increment(1);
                warn!("Job failed: {}", message);
            }
        }

        Ok(())
    }

    /// 执行作业并在任何结果下释放引擎资源
    async fn execute_job(&self, job: &mut Job) -> Result<(), WorkerError> {
        let result = self.run_pipeline(job).await;

        if let Err(e) = self.engine.close().await {
            warn!("Engine close failed: {}", e);
        }

        result
    }

    async fn run_pipeline(&self, job: &mut Job) -> Result<(), WorkerError> {
        self.engine
            .initialize()
            .await
            .map_err(|e| WorkerError::EngineError(e.to_string()))?;

        let urls = job.urls.clone();
        let total = urls.len();
        for (index, url) in urls.iter().enumerate() {
            match self.engine.scrape(url).await {
                Ok(record) => {
                    self.lead_repository
                        .save_lead(&job.user_id, job.id, &record)
                        .await
                        .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
                    info!(
                        "[{}/{}] {} | Score: {} | Confidence: {}%",
                        index + 1,
                        total,
                        url,
                        record.lead_score,
                        record.confidence
                    );
                    job.record_success(record)
                        .map_err(|e| WorkerError::DomainError(e.to_string()))?;
                }
                Err(e) => {
                    error!("[{}/{}] {}: {}", index + 1, total, url, e);
                    job.record_failure(ScrapedRecord::failed(url, e.to_string()))
                        .map_err(|e| WorkerError::DomainError(e.to_string()))?;
                }
            }

            self.job_repository
                .update_job_progress(job.id, job.completed, job.failed)
                .await
                .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
        }

        Ok(())
    }
}

#[async_trait]
impl<Q, J, L, E> Worker for ScrapeWorker<Q, J, L, E>
where
    Q: JobQueue + 'static,
    J: JobRepository + 'static,
    L: LeadRepository + 'static,
    E: ScraperEngine + 'static,
{
    /// 运行工作器轮询循环
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Worker {} started", self.worker_name);

        loop {
            match self.queue.dequeue().await {
                Ok(Some(queued)) => {
                    if let Err(e) = self.process_job(queued).await {
                        error!("Error processing job: {}", e);
                    }
                }
                Ok(None) => {
                    sleep(self.poll_interval).await;
                }
                Err(e) => {
                    error!("Dequeue error: {}", e);
                    sleep(self.poll_interval).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.worker_name
    }
}
