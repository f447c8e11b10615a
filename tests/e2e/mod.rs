// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 端到端测试模块
///
/// 模拟真实用户场景，测试从作业提交到线索产出的完整工作流程
/// 验证队列、调度器、Worker和仓库之间的集成
pub mod complete_workflow_test;
