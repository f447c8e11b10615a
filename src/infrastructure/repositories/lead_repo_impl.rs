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

use crate::domain::models::scraped_record::ScrapedRecord;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::lead_repository::LeadRepository;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// 线索仓库实现
///
/// 基于DashMap实现的线索数据访问层，按作业ID聚合保存提取结果
#[derive(Default)]
pub struct LeadRepositoryImpl {
    /// 线索存储，按作业ID分组
    leads: DashMap<Uuid, Vec<ScrapedRecord>>,
}

impl LeadRepositoryImpl {
    /// 创建新的线索仓库实例
    ///
    /// # 返回值
    ///
    /// 返回新的线索仓库实例
    pub fn new() -> Self {
        Self {
            leads: DashMap::new(),
        }
    }
}

#[async_trait]
impl LeadRepository for LeadRepositoryImpl {
    async fn save_lead(
        &self,
        user_id: &str,
        job_id: Uuid,
        record: &ScrapedRecord,
    ) -> Result<(), RepositoryError> {
        debug!(
            user_id = %user_id,
            job_id = %job_id,
            url = %record.url,
            lead_score = record.lead_score,
            "Saving lead"
        );
        self.leads.entry(job_id).or_default().push(record.clone());
        Ok(())
    }

    async fn leads_for_job(&self, job_id: Uuid) -> Result<Vec<ScrapedRecord>, RepositoryError> {
        Ok(self
            .leads
            .get(&job_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}
