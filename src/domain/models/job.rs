// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_record::ScrapedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 作业实体
///
/// 表示一次批量抓取请求：一个用户提交的URL列表及其处理进度。
/// 作业由Worker独占修改（进度递增、终态迁移），引擎不直接
/// 修改作业记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 提交者ID
    pub user_id: String,
    /// 待抓取的URL列表
    pub urls: Vec<String>,
    /// URL总数
    pub total_urls: u32,
    /// 已成功抓取的URL数
    pub completed: u32,
    /// 已失败的URL数
    pub failed: u32,
    /// 作业状态
    pub status: JobStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 开始处理时间
    pub started_at: Option<DateTime<Utc>>,
    /// 处理完成时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 按提交顺序累积的抓取结果（含失败记录）
    pub results: Vec<ScrapedRecord>,
    /// 作业级错误信息（仅FAILED状态）
    pub error_message: Option<String>,
}

/// 作业状态枚举
///
/// 状态转换遵循以下流程：
/// Queued → Processing → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// 已入队，作业已提交但尚未开始处理
    #[default]
    Queued,
    /// 处理中，Worker正在逐个抓取URL
    Processing,
    /// 已完成，所有URL均已处理（含部分失败）
    Completed,
    /// 已失败，作业级异常导致处理中止
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(JobStatus::Queued),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
///
/// 表示在领域层可能发生的各种错误情况，包括状态转换错误、
/// 验证失败和引擎相关的错误。
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当作业状态转换不符合业务规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 引擎错误，当底层抓取引擎出现问题时发生
    #[error("Engine error: {0}")]
    EngineError(String),
}

impl Job {
    /// 创建一个新的作业
    ///
    /// # 参数
    ///
    /// * `id` - 作业标识符（与队列消息共享）
    /// * `user_id` - 提交者ID
    /// * `urls` - 待抓取的URL列表
    ///
    /// # 返回值
    ///
    /// 返回处于Queued状态的作业实例
    pub fn new(id: Uuid, user_id: String, urls: Vec<String>) -> Self {
        let total_urls = urls.len() as u32;
        Self {
            id,
            user_id,
            urls,
            total_urls,
            completed: 0,
            failed: 0,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            results: Vec::new(),
            error_message: None,
        }
    }

    /// 启动作业
    ///
    /// 将作业状态从Queued变更为Processing
    ///
    /// # 返回值
    ///
    /// * `Ok(Job)` - 成功启动的作业
    /// * `Err(DomainError)` - 状态转换失败
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Queued => {
                self.status = JobStatus::Processing;
                self.started_at = Some(Utc::now());
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 记录一个URL抓取成功
    ///
    /// # 参数
    ///
    /// * `record` - 抓取结果记录
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 进度已更新
    /// * `Err(DomainError)` - 作业不在Processing状态或进度已满
    pub fn record_success(&mut self, record: ScrapedRecord) -> Result<(), DomainError> {
        if self.status != JobStatus::Processing {
            return Err(DomainError::InvalidStateTransition);
        }
        if self.completed + self.failed >= self.total_urls {
            return Err(DomainError::ValidationError(
                "progress counters already cover all urls".to_string(),
            ));
        }
        self.completed += 1;
        self.results.push(record);
        Ok(())
    }

    /// 记录一个URL抓取失败
    ///
    /// 失败记录同样进入结果列表，保留错误信息
    ///
    /// # 参数
    ///
    /// * `record` - 带错误信息的抓取记录
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 进度已更新
    /// * `Err(DomainError)` - 作业不在Processing状态或进度已满
    pub fn record_failure(&mut self, record: ScrapedRecord) -> Result<(), DomainError> {
        if self.status != JobStatus::Processing {
            return Err(DomainError::InvalidStateTransition);
        }
        if self.completed + self.failed >= self.total_urls {
            return Err(DomainError::ValidationError(
                "progress counters already cover all urls".to_string(),
            ));
        }
        self.failed += 1;
        self.results.push(record);
        Ok(())
    }

    /// 完成作业
    ///
    /// 将作业状态从Processing变更为Completed，要求所有URL均已计入进度
    ///
    /// # 返回值
    ///
    /// * `Ok(Job)` - 成功完成的作业
    /// * `Err(DomainError)` - 状态转换失败或进度不完整
    pub fn complete(mut self) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Processing => {
                if self.completed + self.failed != self.total_urls {
                    return Err(DomainError::ValidationError(format!(
                        "cannot complete job: {} of {} urls accounted for",
                        self.completed + self.failed,
                        self.total_urls
                    )));
                }
                self.status = JobStatus::Completed;
                self.completed_at = Some(Utc::now());
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记作业失败
    ///
    /// 作业级异常（如引擎初始化失败）时调用，已累积的部分结果保留
    ///
    /// # 参数
    ///
    /// * `error_message` - 失败原因
    ///
    /// # 返回值
    ///
    /// * `Ok(Job)` - 失败的作业
    /// * `Err(DomainError)` - 状态转换失败
    pub fn fail(mut self, error_message: String) -> Result<Self, DomainError> {
        match self.status {
            JobStatus::Queued | JobStatus::Processing => {
                self.status = JobStatus::Failed;
                self.completed_at = Some(Utc::now());
                self.error_message = Some(error_message);
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}
