// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::QueueSettings;
use crate::queue::job_queue::InMemoryJobQueue;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

/// 作业调度器
///
/// 周期性扫描队列的延迟集合，将到期的重投递消息移回就绪队列。
/// 实际的作业分发由Worker通过dequeue主动拉取。
pub struct JobScheduler {
    /// 作业队列
    queue: Arc<InMemoryJobQueue>,
    /// 扫描间隔
    sweep_interval: Duration,
    /// 后台任务句柄
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobScheduler {
    /// 创建新的作业调度器实例
    ///
    /// # 参数
    ///
    /// * `queue` - 作业队列
    /// * `settings` - 队列配置
    ///
    /// # 返回值
    ///
    /// 返回新的作业调度器实例
    pub fn new(queue: Arc<InMemoryJobQueue>, settings: &QueueSettings) -> Self {
        Self {
            queue,
            sweep_interval: Duration::from_millis(settings.sweep_interval_ms),
            handle: Mutex::new(None),
        }
    }

    /// 启动调度器后台任务
    ///
    /// 重复调用不会产生第二个扫描循环
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }

        let queue = self.queue.clone();
        let sweep_interval = self.sweep_interval;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval(sweep_interval);
            loop {
                ticker.tick().await;
                let promoted = queue.sweep();
                if promoted > 0 {
                    debug!("Promoted {} delayed jobs to ready", promoted);
                }
            }
        }));
    }

    /// 停止调度器后台任务
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
