// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的具体实现
/// 包括作业与线索仓库的内存实现
pub mod job_repo_impl;
pub mod lead_repo_impl;
