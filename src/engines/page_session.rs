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
use crate::domain::models::scraped_record::PerformanceMetrics;
use crate::domain::services::document_view::DocumentView;
use crate::engines::browser_pool::PageGuard;
use crate::engines::traits::EngineError;
use crate::utils::retry_policy::RetryPolicy;
use chromiumoxide::cdp::browser_protocol::emulation::SetScriptExecutionDisabledParams;
use chromiumoxide::cdp::browser_protocol::network::SetBlockedUrLsParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::performance;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 桌面端Chrome用户代理
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 指纹伪装脚本，在每次导航前注入
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => false });
window.chrome = { runtime: {} };
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
"#;

/// 请求过滤的URL子串，两侧补通配符后下发
const BLOCKED_URL_PATTERNS: [&str; 7] = [
    "doubleclick",
    "googletagmanager",
    "facebook",
    "hotjar",
    "google-analytics",
    "analytics.js",
    "fbevents.js",
];

/// 反爬挑战页的标记子串，大小写敏感
const CHALLENGE_MARKERS: [&str; 7] = [
    "cf-chl-bypass",
    "challenge-platform",
    "cf-turnstile",
    "cf-browser-verification",
    "Just a moment",
    "Checking your browser",
    "DDoS protection",
];

/// SPA框架的独立信号子串
const SPA_SIGNAL_MARKERS: [&str; 5] = ["NEXT_DATA", "_next/static", "NUXT", "_nuxt/", "ng-version"];

/// 判定为SPA所需的最少信号数
const SPA_SIGNAL_THRESHOLD: usize = 2;

/// 渲染后正文低于该长度视为空壳页面
const SPARSE_BODY_TEXT_LIMIT: usize = 100;

/// 导航完成后的静置时间
const POST_NAVIGATION_SETTLE: Duration = Duration::from_millis(1000);

/// 升级脚本并重载后的静置时间
const POST_ESCALATION_SETTLE: Duration = Duration::from_millis(2000);

/// 页面会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Navigating,
    ChallengeDetected,
    SpaDetected,
    Ready,
    Extracted,
    Failed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Init => "INIT",
            SessionState::Navigating => "NAVIGATING",
            SessionState::ChallengeDetected => "CHALLENGE_DETECTED",
            SessionState::SpaDetected => "SPA_DETECTED",
            SessionState::Ready => "READY",
            SessionState::Extracted => "EXTRACTED",
            SessionState::Failed => "FAILED",
            SessionState::Closed => "CLOSED",
        };
        write!(f, "{}", label)
    }
}

/// 脚本执行模式
///
/// 模式切换只通过set_scripting完成，切换时同步重装请求过滤器，
/// 避免模式与过滤器状态漂移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptingMode {
    Disabled,
    Enabled,
}

impl fmt::Display for ScriptingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptingMode::Disabled => write!(f, "disabled"),
            ScriptingMode::Enabled => write!(f, "enabled"),
        }
    }
}

/// 单次导航尝试的时限，重试时每次附带全新的期限
#[derive(Debug, Clone, Copy)]
pub struct NavigationDeadline {
    per_attempt: Duration,
}

impl NavigationDeadline {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            per_attempt: Duration::from_millis(ms),
        }
    }

    pub fn per_attempt(&self) -> Duration {
        self.per_attempt
    }
}

/// 页面会话的产出
pub struct SessionOutcome {
    /// 最终HTML快照
    pub html: String,
    /// 页面运行时指标
    pub performance: PerformanceMetrics,
}

/// 判断HTML是否为反爬挑战页
pub(crate) fn is_bot_challenge(html: &str) -> bool {
    CHALLENGE_MARKERS.iter().any(|marker| html.contains(marker))
}

/// 统计页面呈现的SPA信号数量
pub(crate) fn spa_signal_count(view: &DocumentView) -> usize {
    let mut signals = SPA_SIGNAL_MARKERS
        .iter()
        .filter(|marker| view.contains(marker))
        .count();

    // 空壳正文加上框架脚本是一个额外的强信号
    let sparse_body = view.body_text().trim().len() < SPARSE_BODY_TEXT_LIMIT;
    let framework_scripts = view.count_matching("script[src*='_next']") > 0
        || view.count_matching("script[src*='_nuxt']") > 0;
    if sparse_body && framework_scripts {
        signals += 1;
    }

    signals
}

pub(crate) fn metric_value(metrics: &[performance::Metric], name: &str) -> u64 {
    metrics
        .iter()
        .find(|metric| metric.name == name)
        .map(|metric| metric.value as u64)
        .unwrap_or(0)
}

/// 页面会话控制器
///
/// 驱动单个页面的完整生命周期：指纹伪装、禁脚本导航、挑战与SPA
/// 升级、HTML快照和运行时指标采集。状态每次变更都会记录日志。
pub struct PageSession {
    guard: PageGuard,
    state: SessionState,
    scripting: ScriptingMode,
    deadline: NavigationDeadline,
    max_retries: u32,
    adaptive_scripting: bool,
}

impl PageSession {
    /// 创建新的页面会话
    ///
    /// # 参数
    ///
    /// * `guard` - 从浏览器池获取的页面守卫
    /// * `config` - 引擎配置
    ///
    /// # 返回值
    ///
    /// 返回处于INIT状态的会话
    pub fn new(guard: PageGuard, config: &EngineConfig) -> Self {
        Self {
            guard,
            state: SessionState::Init,
            // 浏览器新开页面默认启用脚本
            scripting: ScriptingMode::Enabled,
            deadline: NavigationDeadline::from_millis(config.navigation_timeout_ms),
            max_retries: config.max_retries,
            adaptive_scripting: config.enable_adaptive_scripting,
        }
    }

    /// 当前会话状态
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 执行完整的会话流程
    ///
    /// 导航后先在禁脚本模式下取快照；检测到挑战页或SPA时升级一次
    /// 脚本并重载。挑战升级优先于SPA升级，两者最多发生一个。
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(SessionOutcome)` - 最终HTML与运行时指标
    /// * `Err(EngineError)` - 导航或协议错误
    pub async fn run(&mut self, url: &str) -> Result<SessionOutcome, EngineError> {
        self.prepare().await?;
        self.navigate(url).await?;
        tokio::time::sleep(POST_NAVIGATION_SETTLE).await;

        let mut html = self.capture_html().await?;

        if is_bot_challenge(&html) {
            warn!("Bot challenge detected, enabling scripting for {}", url);
            self.transition(SessionState::ChallengeDetected);
            html = self.escalate().await?;
        } else {
            let signals = spa_signal_count(&DocumentView::parse(html.clone()));
            if signals >= SPA_SIGNAL_THRESHOLD && self.adaptive_scripting {
                info!(
                    "SPA detected ({} signals), enabling scripting for {}",
                    signals, url
                );
                self.transition(SessionState::SpaDetected);
                html = self.escalate().await?;
            } else {
                self.transition(SessionState::Ready);
            }
        }

        let performance = self.capture_metrics().await?;
        self.transition(SessionState::Extracted);

        Ok(SessionOutcome { html, performance })
    }

    /// 标记会话失败
    pub fn mark_failed(&mut self) {
        if self.state != SessionState::Failed {
            self.transition(SessionState::Failed);
        }
    }

    /// 关闭会话并释放页面
    pub async fn close(mut self) {
        self.transition(SessionState::Closed);
        self.guard.close().await;
    }

    /// 注入指纹伪装、设置用户代理并进入禁脚本模式
    async fn prepare(&mut self) -> Result<(), EngineError> {
        let page = self.guard.page()?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;
        page.set_user_agent(USER_AGENT)
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;
        self.set_scripting(ScriptingMode::Disabled).await
    }

    /// 带重试的导航，每次尝试都有独立的超时期限
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.transition(SessionState::Navigating);
        let policy = RetryPolicy::immediate(self.max_retries);
        let mut attempt: u32 = 1;

        loop {
            let error = match tokio::time::timeout(
                self.deadline.per_attempt(),
                self.guard.page()?.goto(url),
            )
            .await
            {
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(e)) => EngineError::NavigationFailed(e.to_string()),
                Err(_) => EngineError::Timeout,
            };

            if !error.is_retryable() || !policy.should_retry(attempt) {
                return Err(error);
            }
            warn!(
                "Retry {}/{} for {}: {}",
                attempt, self.max_retries, url, error
            );
            let backoff = policy.calculate_backoff(attempt);
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
            attempt += 1;
        }
    }

    /// 切换脚本执行模式
    ///
    /// 同一次切换会重装请求过滤器。模式未变化时不做任何事。
    async fn set_scripting(&mut self, mode: ScriptingMode) -> Result<(), EngineError> {
        if self.scripting == mode {
            return Ok(());
        }
        let disable = mode == ScriptingMode::Disabled;
        self.guard
            .page()?
            .execute(SetScriptExecutionDisabledParams::new(disable))
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;
        self.install_request_filter().await?;
        debug!("Scripting mode {} -> {}", self.scripting, mode);
        self.scripting = mode;
        Ok(())
    }

    /// 下发跟踪脚本与分析请求的过滤规则
    async fn install_request_filter(&self) -> Result<(), EngineError> {
        let patterns = BLOCKED_URL_PATTERNS
            .iter()
            .map(|pattern| format!("*{}*", pattern))
            .collect();
        self.guard
            .page()?
            .execute(SetBlockedUrLsParams::new(patterns))
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;
        Ok(())
    }

    /// 启用脚本、重载页面并重新取快照
    async fn escalate(&mut self) -> Result<String, EngineError> {
        self.set_scripting(ScriptingMode::Enabled).await?;

        match tokio::time::timeout(self.deadline.per_attempt(), self.guard.page()?.reload()).await {
            Ok(result) => {
                result.map_err(|e| EngineError::NavigationFailed(e.to_string()))?;
            }
            Err(_) => return Err(EngineError::Timeout),
        }

        tokio::time::sleep(POST_ESCALATION_SETTLE).await;
        self.capture_html().await
    }

    async fn capture_html(&self) -> Result<String, EngineError> {
        self.guard
            .page()?
            .content()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    /// 采集页面运行时指标，缺失的指标按0处理
    async fn capture_metrics(&self) -> Result<PerformanceMetrics, EngineError> {
        let page = self.guard.page()?;
        page.execute(performance::EnableParams::default())
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;
        let response = page
            .execute(performance::GetMetricsParams::default())
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?;

        let metrics = &response.result.metrics;
        Ok(PerformanceMetrics {
            js_heap_bytes: metric_value(metrics, "JSHeapUsedSize"),
            dom_nodes: metric_value(metrics, "Nodes"),
            document_count: metric_value(metrics, "Documents"),
        })
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state {} -> {}", self.state, next);
        self.state = next;
    }
}
