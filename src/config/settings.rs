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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// 应用程序配置设置
///
/// 包含浏览器引擎、作业队列、Worker和截图等所有配置项
#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    /// 浏览器引擎配置
    #[validate(nested)]
    pub engine: EngineConfig,
    /// 作业队列配置
    #[validate(nested)]
    pub queue: QueueSettings,
    /// Worker配置
    #[validate(nested)]
    pub worker: WorkerSettings,
    /// 截图配置
    pub screenshot: ScreenshotSettings,
}

/// 浏览器引擎配置
///
/// 引擎启动后不可变更
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EngineConfig {
    /// 最大并发页面数
    #[validate(range(min = 1, message = "max_concurrent_pages must be at least 1"))]
    pub max_concurrent_pages: usize,
    /// 浏览器回收前处理的任务数
    #[validate(range(min = 1, message = "recycle_after_tasks must be at least 1"))]
    pub recycle_after_tasks: u32,
    /// 单次导航超时时间（毫秒）
    #[validate(range(min = 1000, message = "navigation_timeout_ms must be at least 1000"))]
    pub navigation_timeout_ms: u64,
    /// 导航最大尝试次数（含首次尝试）
    #[validate(range(min = 1, message = "max_retries must be at least 1"))]
    pub max_retries: u32,
    /// 是否启用自适应脚本执行（SPA检测后升级）
    pub enable_adaptive_scripting: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 6,
            recycle_after_tasks: 25,
            navigation_timeout_ms: 35_000,
            max_retries: 2,
            enable_adaptive_scripting: true,
        }
    }
}

/// 作业队列配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QueueSettings {
    /// 单个作业的最大投递次数
    #[validate(range(min = 1, message = "max_attempts must be at least 1"))]
    pub max_attempts: u32,
    /// 首次重投递延迟（毫秒），后续按指数增长
    pub retry_initial_delay_ms: u64,
    /// 调度器扫描间隔（毫秒）
    #[validate(range(min = 1, message = "sweep_interval_ms must be at least 1"))]
    pub sweep_interval_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_initial_delay_ms: 2_000,
            sweep_interval_ms: 500,
        }
    }
}

/// Worker配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkerSettings {
    /// Worker数量
    #[validate(range(min = 1, message = "count must be at least 1"))]
    pub count: usize,
    /// 队列为空时的轮询间隔（毫秒）
    pub poll_interval_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: 1,
            poll_interval_ms: 1_000,
        }
    }
}

/// 截图配置
#[derive(Debug, Clone, Deserialize)]
pub struct ScreenshotSettings {
    /// 高价值线索截图输出目录
    pub output_dir: String,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            output_dir: "leads".to_string(),
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default engine settings
            .set_default("engine.max_concurrent_pages", 6)?
            .set_default("engine.recycle_after_tasks", 25)?
            .set_default("engine.navigation_timeout_ms", 35_000)?
            .set_default("engine.max_retries", 2)?
            .set_default("engine.enable_adaptive_scripting", true)?
            // Default queue settings
            .set_default("queue.max_attempts", 3)?
            .set_default("queue.retry_initial_delay_ms", 2_000)?
            .set_default("queue.sweep_interval_ms", 500)?
            // Default worker settings
            .set_default("worker.count", 1)?
            .set_default("worker.poll_interval_ms", 1_000)?
            // Default screenshot settings
            .set_default("screenshot.output_dir", "leads")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LEADRS").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(settings)
    }
}
