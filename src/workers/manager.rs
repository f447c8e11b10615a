// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{EngineConfig, WorkerSettings};
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::repositories::lead_repository::LeadRepository;
use crate::engines::chromium_engine::ChromiumEngine;
use crate::queue::job_queue::JobQueue;
use crate::workers::scrape_worker::ScrapeWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 持有仓库与队列的共享句柄，为每个工作器创建独立的浏览器引擎
pub struct WorkerManager<Q, J, L>
where
    Q: JobQueue + 'static,
    J: JobRepository + 'static,
    L: LeadRepository + 'static,
{
    queue: Arc<Q>,
    job_repository: Arc<J>,
    lead_repository: Arc<L>,
    engine_config: EngineConfig,
    worker_settings: WorkerSettings,
    handles: Vec<JoinHandle<()>>,
}

impl<Q, J, L> WorkerManager<Q, J, L>
where
    Q: JobQueue + 'static,
    J: JobRepository + 'static,
    L: LeadRepository + 'static,
{
    /// 创建新的工作管理器实例
    ///
    /// # 参数
    ///
    /// * `queue` - 作业队列
    /// * `job_repository` - 作业仓库
    /// * `lead_repository` - 线索仓库
    /// * `engine_config` - 引擎配置
    /// * `worker_settings` - Worker配置
    pub fn new(
        queue: Arc<Q>,
        job_repository: Arc<J>,
        lead_repository: Arc<L>,
        engine_config: EngineConfig,
        worker_settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            job_repository,
            lead_repository,
            engine_config,
            worker_settings,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 按配置数量创建并启动工作器，每个工作器持有独立的引擎实例
    pub async fn start_workers(&mut self) {
        for index in 0..self.worker_settings.count {
            let engine = Arc::new(ChromiumEngine::new(self.engine_config.clone()));
            let worker = ScrapeWorker::new(
                self.queue.clone(),
                self.job_repository.clone(),
                self.lead_repository.clone(),
                engine,
                &self.worker_settings,
                format!("scrape-worker-{}", index + 1),
            );

            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("Worker exited with error: {}", e);
                }
            });
            self.handles.push(handle);
        }

        info!("Started {} scrape workers", self.worker_settings.count);
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}
