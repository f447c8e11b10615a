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

use leadrs::config::settings::Settings;
use leadrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use leadrs::infrastructure::repositories::lead_repo_impl::LeadRepositoryImpl;
use leadrs::queue::job_queue::InMemoryJobQueue;
use leadrs::queue::scheduler::JobScheduler;
use leadrs::utils::telemetry;
use leadrs::workers::manager::WorkerManager;
use std::sync::Arc;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting leadrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Initialize repositories
    let job_repository = Arc::new(JobRepositoryImpl::new());
    let lead_repository = Arc::new(LeadRepositoryImpl::new());

    // 4. Initialize queue and retry scheduler
    let queue = Arc::new(InMemoryJobQueue::new(&settings.queue));
    let scheduler = JobScheduler::new(queue.clone(), &settings.queue);
    scheduler.start();
    info!("Job queue and scheduler initialized");

    // 5. Start Workers
    let mut worker_manager = WorkerManager::new(
        queue.clone(),
        job_repository,
        lead_repository,
        settings.engine.clone(),
        settings.worker.clone(),
    );
    worker_manager.start_workers().await;

    // 6. Wait for shutdown signal
    worker_manager.wait_for_shutdown().await;
    scheduler.stop();

    Ok(())
}
