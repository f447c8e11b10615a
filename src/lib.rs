// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 实现基于浏览器的网页抓取引擎
pub mod engines;

/// 基础设施模块
///
/// 提供仓库接口的具体实现
pub mod infrastructure;

/// 队列模块
///
/// 实现作业队列和调度功能
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现后台作业处理和工作器管理
pub mod workers;
