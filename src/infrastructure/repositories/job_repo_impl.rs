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

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::models::scraped_record::ScrapedRecord;
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// 作业仓库实现
///
/// 基于DashMap实现的作业数据访问层，按作业ID分片并发存取
#[derive(Default)]
pub struct JobRepositoryImpl {
    /// 作业存储
    jobs: DashMap<Uuid, Job>,
}

impl JobRepositoryImpl {
    /// 创建新的作业仓库实例
    ///
    /// # 返回值
    ///
    /// 返回新的作业仓库实例
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn upsert_job(&self, job: &Job) -> Result<Job, RepositoryError> {
        self.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn update_job_progress(
        &self,
        job_id: Uuid,
        completed: u32,
        failed: u32,
    ) -> Result<(), RepositoryError> {
        let mut entry = self.jobs.get_mut(&job_id).ok_or(RepositoryError::NotFound)?;
        entry.completed = completed;
        entry.failed = failed;
        Ok(())
    }

    async fn finalize_job(
        &self,
        job_id: Uuid,
        status: JobStatus,
        results: Vec<ScrapedRecord>,
        error_message: Option<String>,
    ) -> Result<(), RepositoryError> {
        let mut entry = self.jobs.get_mut(&job_id).ok_or(RepositoryError::NotFound)?;
        entry.status = status;
        entry.results = results;
        entry.error_message = error_message;
        entry.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn find_job(&self, job_id: Uuid) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.get(&job_id).map(|entry| entry.clone()))
    }
}
