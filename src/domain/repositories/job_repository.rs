// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::models::scraped_record::ScrapedRecord;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(String),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 作业仓库特质
///
/// 定义作业数据访问接口，由Worker在作业处理的各阶段调用
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建或覆盖作业记录
    async fn upsert_job(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 更新作业进度计数
    async fn update_job_progress(
        &self,
        job_id: Uuid,
        completed: u32,
        failed: u32,
    ) -> Result<(), RepositoryError>;
    /// 将作业迁移到终态并写入聚合结果
    async fn finalize_job(
        &self,
        job_id: Uuid,
        status: JobStatus,
        results: Vec<ScrapedRecord>,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError>;
    /// 根据ID查找作业
    async fn find_job(&self, job_id: Uuid) -> Result<Option<Job>, RepositoryError>;
}
