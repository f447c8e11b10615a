// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 作业（job）：一次批量抓取请求及其进度
/// - 抓取记录（scraped_record）：单个URL产出的商业情报
///
/// 这些模型构成了系统的数据基础，定义了业务概念的
/// 结构和行为，是领域驱动设计的核心组成部分。
pub mod job;
pub mod scraped_record;
