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
use crate::utils::url_utils;
use async_trait::async_trait;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动失败
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::NavigationFailed(_) => true,
            EngineError::Timeout => true,
            // Launch failures are fatal, CDP errors are not worth another attempt
            EngineError::LaunchFailed(_) => false,
            EngineError::Other(_) => false,
        }
    }
}

/// 批量抓取选项
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 每批并发抓取的URL数量
    pub batch_size: usize,
    /// 批次之间的延迟（毫秒）
    pub inter_batch_delay_ms: u64,
    /// 是否对高分线索自动截图
    pub screenshot_high_priority: bool,
    /// 截图输出目录
    pub screenshot_dir: PathBuf,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            inter_batch_delay_ms: 2000,
            screenshot_high_priority: false,
            screenshot_dir: PathBuf::from("leads"),
        }
    }
}

/// 高分线索自动截图的评分门槛
const SCREENSHOT_SCORE_THRESHOLD: u8 = 70;

/// 抓取引擎特质
///
/// 单URL抓取产出完整的线索记录，批量抓取在此之上提供
/// 分批并发、失败隔离和可选的高分线索截图。
#[async_trait]
pub trait ScraperEngine: Send + Sync {
    /// 启动浏览器资源，启动失败直接返回错误
    async fn initialize(&self) -> Result<(), EngineError>;

    /// 抓取单个URL并产出评分后的线索记录
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapedRecord)` - 提取并评分完成的记录
    /// * `Err(EngineError)` - 重试耗尽后的导航错误或致命错误
    async fn scrape(&self, url: &str) -> Result<ScrapedRecord, EngineError>;

    /// 对URL进行全页截图并保存到指定路径
    async fn screenshot(&self, url: &str, path: &Path) -> Result<(), EngineError>;

    /// 关闭引擎并释放浏览器资源，可重复调用
    async fn close(&self) -> Result<(), EngineError>;

    /// 批量抓取URL列表
    ///
    /// 永不返回错误：每个失败的URL变成一条带error字段的记录，
    /// 结果数量总是等于输入数量，顺序与输入一致。
    ///
    /// # 参数
    ///
    /// * `urls` - 目标URL列表
    /// * `options` - 批量抓取选项
    ///
    /// # 返回值
    ///
    /// 返回与输入等长的记录列表
    async fn scrape_batch(&self, urls: &[String], options: &BatchOptions) -> Vec<ScrapedRecord> {
        let mut results = Vec::with_capacity(urls.len());
        let batch_size = options.batch_size.max(1);
        let total = urls.len();
        let chunk_count = urls.chunks(batch_size).count();

        for (chunk_index, chunk) in urls.chunks(batch_size).enumerate() {
            let outcomes = join_all(chunk.iter().map(|url| self.scrape(url))).await;

            for (offset, outcome) in outcomes.into_iter().enumerate() {
                let position = chunk_index * batch_size + offset + 1;
                let url = &chunk[offset];
                match outcome {
                    Ok(record) => {
                        if options.screenshot_high_priority
                            && record.lead_score >= SCREENSHOT_SCORE_THRESHOLD
                        {
                            self.capture_lead_screenshot(&record, options).await;
                        }
                        info!(
                            "[{}/{}] {} | Score: {} | Confidence: {}%",
                            position, total, url, record.lead_score, record.confidence
                        );
                        results.push(record);
                    }
                    Err(e) => {
                        error!("[{}/{}] {}: {}", position, total, url, e);
                        results.push(ScrapedRecord::failed(url, e.to_string()));
                    }
                }
            }

            if chunk_index + 1 < chunk_count {
                tokio::time::sleep(Duration::from_millis(options.inter_batch_delay_ms)).await;
            }
        }

        results
    }

    /// 为高分线索保存截图，失败只记录日志
    async fn capture_lead_screenshot(&self, record: &ScrapedRecord, options: &BatchOptions) {
        let parsed = match Url::parse(&record.url) {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Screenshot skipped, unparseable url: {}", record.url);
                return;
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(&options.screenshot_dir).await {
            warn!(
                "Screenshot directory {} unavailable: {}",
                options.screenshot_dir.display(),
                e
            );
            return;
        }

        let host = url_utils::hostname_stripped(&parsed);
        let path = options.screenshot_dir.join(format!("{}.png", host));
        if let Err(e) = self.screenshot(&record.url, &path).await {
            warn!("Screenshot failed for {}: {}", record.url, e);
        }
    }
}
