// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置单元测试
///
/// 测试配置加载、环境变量覆盖和校验
pub mod settings_test;
