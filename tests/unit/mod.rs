// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 单元测试模块
///
/// 测试各个组件的独立功能
pub mod config;
pub mod workers;
