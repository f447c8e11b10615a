// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含系统的核心业务逻辑服务，这些服务封装了复杂的
/// 业务规则和领域逻辑，协调多个领域对象来完成业务操作。
///
/// 包含的服务：
/// - 文档视图（document_view）：对抓取到的HTML提供类型化的只读访问
/// - 内容提取器（content_extractor）：从文档中启发式提取商业信息
/// - 线索评分器（lead_scorer）：将提取信号折算为线索评分与优先级
///
/// 这些服务均为纯计算：不访问网络，不持有可变状态，
/// 便于在不启动浏览器的情况下独立测试。
pub mod content_extractor;
pub mod document_view;
pub mod lead_scorer;
