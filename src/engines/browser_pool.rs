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
use crate::engines::traits::EngineError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 浏览器窗口宽度
const VIEWPORT_WIDTH: u32 = 1920;
/// 浏览器窗口高度
const VIEWPORT_HEIGHT: u32 = 1080;

/// Chromium启动参数，--no-sandbox由构建器提供
const LAUNCH_ARGS: [&str; 6] = [
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
];

/// 已启动的浏览器进程及其事件处理任务
struct LaunchedBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

/// 浏览器页面守卫
///
/// 持有一个打开的页面和对应的并发许可。显式调用close关闭页面；
/// 提前退出时Drop兜底关闭，许可在守卫销毁时释放。
pub struct PageGuard {
    page: Option<Page>,
    _permit: OwnedSemaphorePermit,
}

impl PageGuard {
    /// 访问底层页面
    pub fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Other("page already closed".to_string()))
    }

    /// 关闭页面并释放并发许可
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close error: {}", e);
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        gauge!("browser_pool_active_pages").decrement(1.0);
        // Early-exit paths still close the page, off-task
        if let Some(page) = self.page.take() {
            tokio::spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}

/// 浏览器池管理器
///
/// 独占持有零或一个长生命周期的浏览器进程。页面槽位由信号量限流，
/// 任务计数达到recycle_after_tasks时在下一次acquire前回收并重启
/// 浏览器进程。所有计数器都是实例字段，进程内多worker互不共享。
pub struct BrowserPool {
    recycle_after_tasks: u32,
    request_timeout: Duration,
    browser: AsyncMutex<Option<LaunchedBrowser>>,
    slots: Arc<Semaphore>,
    tasks_since_recycle: Mutex<u32>,
}

impl BrowserPool {
    /// 创建新的浏览器池，不立即启动浏览器
    ///
    /// # 参数
    ///
    /// * `config` - 引擎配置
    ///
    /// # 返回值
    ///
    /// 返回新的浏览器池实例
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            recycle_after_tasks: config.recycle_after_tasks,
            request_timeout: Duration::from_millis(config.navigation_timeout_ms),
            browser: AsyncMutex::new(None),
            slots: Arc::new(Semaphore::new(config.max_concurrent_pages)),
            tasks_since_recycle: Mutex::new(0),
        }
    }

    /// 确保浏览器已启动
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 浏览器已在运行或启动成功
    /// * `Err(EngineError::LaunchFailed)` - 启动失败
    pub async fn ensure_launched(&self) -> Result<(), EngineError> {
        let mut state = self.browser.lock().await;
        if state.is_none() {
            *state = Some(self.launch().await?);
        }
        Ok(())
    }

    /// 获取一个页面槽位并打开新页面
    ///
    /// 在空闲槽位出现之前挂起。到期的回收在开页前执行；浏览器
    /// 未运行时（首次使用或上次崩溃后）透明地重新启动。
    ///
    /// # 返回值
    ///
    /// * `Ok(PageGuard)` - 打开的页面守卫
    /// * `Err(EngineError)` - 启动失败或页面打开失败
    pub async fn acquire(&self) -> Result<PageGuard, EngineError> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        let mut state = self.browser.lock().await;

        let recycle_due = { *self.tasks_since_recycle.lock() >= self.recycle_after_tasks };
        if recycle_due {
            if let Some(launched) = state.take() {
                info!(
                    "Recycling browser after {} completed tasks",
                    self.recycle_after_tasks
                );
                Self::shutdown_launched(launched).await;
                counter!("browser_pool_recycles_total").increment(1);
            }
            *self.tasks_since_recycle.lock() = 0;
        }

        if state.is_none() {
            *state = Some(self.launch().await?);
        }
        let launched = state
            .as_ref()
            .ok_or_else(|| EngineError::LaunchFailed("browser state empty".to_string()))?;

        match launched.browser.new_page("about:blank").await {
            Ok(page) => {
                gauge!("browser_pool_active_pages").increment(1.0);
                Ok(PageGuard {
                    page: Some(page),
                    _permit: permit,
                })
            }
            Err(e) => {
                // Crashed browser surfaces as a task failure; dropping the
                // handle makes the next acquire relaunch
                warn!("Failed to open page, dropping browser: {}", e);
                if let Some(launched) = state.take() {
                    Self::shutdown_launched(launched).await;
                }
                Err(EngineError::Other(format!("Failed to open page: {}", e)))
            }
        }
    }

    /// 记录一次任务完成
    ///
    /// 成功与失败的任务都计入回收节奏。计数器只会在回收时归零。
    pub fn record_completion(&self) {
        let mut tasks = self.tasks_since_recycle.lock();
        *tasks += 1;
        debug!(
            "Pool task {}/{} toward recycle",
            *tasks, self.recycle_after_tasks
        );
    }

    /// 当前回收周期内已完成的任务数
    pub fn task_count(&self) -> u32 {
        *self.tasks_since_recycle.lock()
    }

    /// 关闭浏览器进程，可重复调用
    pub async fn shutdown(&self) {
        let mut state = self.browser.lock().await;
        if let Some(launched) = state.take() {
            info!("Shutting down browser");
            Self::shutdown_launched(launched).await;
        }
    }

    async fn launch(&self) -> Result<LaunchedBrowser, EngineError> {
        info!("Launching browser");

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .request_timeout(self.request_timeout);
        for arg in LAUNCH_ARGS {
            builder = builder.arg(arg);
        }
        let config = builder.build().map_err(EngineError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::LaunchFailed(e.to_string()))?;

        // Drive browser events until the connection drops
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(LaunchedBrowser {
            browser,
            handler_task,
        })
    }

    async fn shutdown_launched(launched: LaunchedBrowser) {
        let LaunchedBrowser {
            mut browser,
            handler_task,
        } = launched;
        if let Err(e) = browser.close().await {
            warn!("Browser close error: {}", e);
        }
        let _ = browser.wait().await;
        handler_task.abort();
    }
}
