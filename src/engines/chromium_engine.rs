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

use crate::config::settings::EngineConfig;
use crate::domain::models::scraped_record::ScrapedRecord;
use crate::domain::services::content_extractor::ContentExtractor;
use crate::domain::services::document_view::DocumentView;
use crate::domain::services::lead_scorer::LeadScorer;
use crate::engines::browser_pool::BrowserPool;
use crate::engines::page_session::{PageSession, SessionOutcome};
use crate::engines::traits::{EngineError, ScraperEngine};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// 截图导航的独立时限，与常规抓取的超时互不影响
const SCREENSHOT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// 基于Chromium的抓取引擎
///
/// 从浏览器池获取页面，经页面会话完成导航与快照，再交由内容
/// 提取器和线索评分器产出结构化记录。引擎自身无全局状态，可
/// 为每个工作器独立创建实例。
pub struct ChromiumEngine {
    config: EngineConfig,
    pool: BrowserPool,
}

impl ChromiumEngine {
    /// 创建新的Chromium引擎
    ///
    /// # 参数
    ///
    /// * `config` - 引擎配置
    ///
    /// # 返回值
    ///
    /// 返回引擎实例，浏览器在首次使用时才会启动
    pub fn new(config: EngineConfig) -> Self {
        let pool = BrowserPool::new(&config);
        Self { config, pool }
    }
}

#[async_trait]
impl ScraperEngine for ChromiumEngine {
    /// 预启动浏览器
    async fn initialize(&self) -> Result<(), EngineError> {
        self.pool.ensure_launched().await
    }

    /// 抓取单个URL并产出评分后的记录
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapedRecord)` - 提取并评分后的记录
    /// * `Err(EngineError)` - 导航或浏览器错误
    async fn scrape(&self, url: &str) -> Result<ScrapedRecord, EngineError> {
        debug!("Scraping {}", url);
        let guard = self.pool.acquire().await?;
        let mut session = PageSession::new(guard, &self.config);

        let outcome = session.run(url).await;
        if outcome.is_err() {
            session.mark_failed();
        }
        session.close().await;
        // 成功与失败都计入回收周期
        self.pool.record_completion();

        let SessionOutcome { html, performance } = outcome?;

        let record = {
            let view = DocumentView::parse(html);
            let mut record = ContentExtractor::extract(url, &view);
            record.performance = performance;
            LeadScorer::score(record)
        };
        Ok(record)
    }

    /// 对URL截取整页PNG
    ///
    /// 截图不计入回收周期，页面在任何结果下都会被释放。
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `path` - PNG输出路径
    async fn screenshot(&self, url: &str, path: &Path) -> Result<(), EngineError> {
        let guard = self.pool.acquire().await?;

        let result = async {
            let page = guard.page()?;
            match tokio::time::timeout(SCREENSHOT_NAVIGATION_TIMEOUT, page.goto(url)).await {
                Ok(navigated) => {
                    navigated.map_err(|e| EngineError::NavigationFailed(e.to_string()))?;
                }
                Err(_) => return Err(EngineError::Timeout),
            }

            page.save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
                path,
            )
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

            info!("Screenshot saved to {}", path.display());
            Ok(())
        }
        .await;

        guard.close().await;
        result
    }

    /// 关闭浏览器并释放资源
    async fn close(&self) -> Result<(), EngineError> {
        self.pool.shutdown().await;
        Ok(())
    }
}
