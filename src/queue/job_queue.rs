// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::QueueSettings;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;
use validator::Validate;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 提交内容未通过校验
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// 消息未找到
    #[error("Message not found")]
    NotFound,
}

/// 作业提交内容
///
/// 入队时校验：URL列表1到100条，每个条目必须是可解析的绝对URL
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobSubmission {
    /// 提交者ID
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,
    /// 待抓取的URL列表
    #[validate(length(min = 1, max = 100, message = "urls must contain 1 to 100 entries"))]
    pub urls: Vec<String>,
    /// 提交时间
    pub submitted_at: DateTime<Utc>,
}

impl JobSubmission {
    /// 创建新的作业提交
    ///
    /// # 参数
    ///
    /// * `user_id` - 提交者ID
    /// * `urls` - 待抓取的URL列表
    ///
    /// # 返回值
    ///
    /// 返回带当前提交时间的提交内容
    pub fn new(user_id: impl Into<String>, urls: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            urls,
            submitted_at: Utc::now(),
        }
    }
}

/// 投递给Worker的队列消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    /// 作业ID，贯穿队列、作业仓库与线索仓库
    pub job_id: Uuid,
    /// 提交内容
    pub submission: JobSubmission,
    /// 当前投递次数（从1开始）
    pub attempt: u32,
}

/// 作业队列特质
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 入队作业
    async fn enqueue(&self, submission: JobSubmission) -> Result<Uuid, QueueError>;

    /// 出队作业
    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError>;

    /// 完成作业
    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError>;
    /// 失败作业，按退避策略重投递或丢弃
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError>;
}

#[derive(Default)]
struct QueueState {
    /// 可立即投递的消息
    ready: VecDeque<QueuedJob>,
    /// 延迟重投递的消息及其到期时间
    delayed: Vec<(Instant, QueuedJob)>,
    /// 已投递、尚未确认的消息
    in_flight: HashMap<Uuid, QueuedJob>,
}

/// 内存作业队列实现
///
/// 三段式状态：就绪队列、延迟重投递集合、在途消息表。失败的
/// 消息按指数退避重新排期，投递次数耗尽后丢弃。
pub struct InMemoryJobQueue {
    state: Mutex<QueueState>,
    retry_policy: RetryPolicy,
}

impl InMemoryJobQueue {
    /// 创建新的内存作业队列实例
    ///
    /// # 参数
    ///
    /// * `settings` - 队列配置
    ///
    /// # 返回值
    ///
    /// 返回新的内存作业队列实例
    pub fn new(settings: &QueueSettings) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            retry_policy: RetryPolicy::queue_redelivery(
                settings.max_attempts,
                Duration::from_millis(settings.retry_initial_delay_ms),
            ),
        }
    }

    /// 将到期的延迟消息移回就绪队列
    ///
    /// # 返回值
    ///
    /// 返回本次移动的消息数量
    pub fn sweep(&self) -> usize {
        let mut state = self.state.lock();
        let now = Instant::now();
        let mut promoted = 0;

        let mut index = 0;
        while index < state.delayed.len() {
            if state.delayed[index].0 <= now {
                let (_, job) = state.delayed.swap_remove(index);
                debug!("Redelivering job {} (attempt {})", job.job_id, job.attempt);
                state.ready.push_back(job);
                promoted += 1;
            } else {
                index += 1;
            }
        }

        promoted
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    /// 入队作业
    ///
    /// # 参数
    ///
    /// * `submission` - 作业提交内容
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 新作业的ID
    /// * `Err(QueueError)` - 提交内容未通过校验
    async fn enqueue(&self, submission: JobSubmission) -> Result<Uuid, QueueError> {
        submission
            .validate()
            .map_err(|e| QueueError::InvalidSubmission(e.to_string()))?;
        for url in &submission.urls {
            Url::parse(url)
                .map_err(|_| QueueError::InvalidSubmission(format!("invalid url: {}", url)))?;
        }

        let job_id = Uuid::new_v4();
        let queued = QueuedJob {
            job_id,
            submission,
            attempt: 1,
        };

        let mut state = self.state.lock();
        state.ready.push_back(queued);
        debug!("Job {} enqueued", job_id);
        Ok(job_id)
    }

    /// 出队作业
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(QueuedJob))` - 成功出队的消息
    /// * `Ok(None)` - 没有可投递的消息
    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError> {
        let mut state = self.state.lock();
        let queued = match state.ready.pop_front() {
            Some(queued) => queued,
            None => return Ok(None),
        };
        state.in_flight.insert(queued.job_id, queued.clone());
        Ok(Some(queued))
    }

    /// 完成作业并确认消息
    ///
    /// # 参数
    ///
    /// * `job_id` - 作业ID
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 成功
    /// * `Err(QueueError)` - 消息不在在途状态
    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        state
            .in_flight
            .remove(&job_id)
            .ok_or(QueueError::NotFound)?;
        debug!("Job {} acknowledged", job_id);
        Ok(())
    }

    /// 失败作业
    ///
    /// 还有剩余投递次数时按指数退避排期重投递，否则丢弃消息
    ///
    /// # 参数
    ///
    /// * `job_id` - 作业ID
    /// * `error` - 失败原因
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 成功
    /// * `Err(QueueError)` - 消息不在在途状态
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        let mut queued = state
            .in_flight
            .remove(&job_id)
            .ok_or(QueueError::NotFound)?;

        if self.retry_policy.should_retry(queued.attempt) {
            let delay = self.retry_policy.calculate_backoff(queued.attempt);
            warn!(
                "Job {} attempt {} failed: {}, redelivery in {:?}",
                job_id, queued.attempt, error, delay
            );
            queued.attempt += 1;
            state.delayed.push((Instant::now() + delay, queued));
        } else {
            warn!(
                "Job {} dropped after {} attempts: {}",
                job_id, queued.attempt, error
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue(&self, submission: JobSubmission) -> Result<Uuid, QueueError> {
        (**self).enqueue(submission).await
    }

    async fn dequeue(&self) -> Result<Option<QueuedJob>, QueueError> {
        (**self).dequeue().await
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        (**self).complete(job_id).await
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<(), QueueError> {
        (**self).fail(job_id, error).await
    }
}
