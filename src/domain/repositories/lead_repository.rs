// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job_repository::RepositoryError;
use crate::domain::models::scraped_record::ScrapedRecord;
use async_trait::async_trait;
use uuid::Uuid;

/// 线索仓库特质
///
/// 定义线索数据访问接口，仅保存成功的抓取记录
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// 保存一条线索记录
    async fn save_lead(
        &self,
        user_id: &str,
        job_id: Uuid,
        record: &ScrapedRecord,
    ) -> Result<(), RepositoryError>;
    /// 查询某作业的全部线索
    async fn leads_for_job(&self, job_id: Uuid) -> Result<Vec<ScrapedRecord>, RepositoryError>;
}
