// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 抓取结果记录
///
/// 单个URL抓取产出的结构化商业情报，创建后不可变。
/// 失败的抓取同样产出一条记录，仅填充url、时间戳和错误信息。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedRecord {
    /// 抓取的目标URL
    pub url: String,
    /// 抓取完成时间
    pub scraped_at: DateTime<Utc>,
    /// 公司Logo图片地址（解析为绝对URL，未找到时为空）
    pub logo: String,
    /// 公司名称
    pub name: String,
    /// 公司描述
    pub description: String,
    /// 推断的业务类型
    pub business_type: String,
    /// 页面关键词（meta keywords）
    pub keywords: String,
    /// 提取到的最佳联系邮箱
    pub email: String,
    /// 提取到的联系电话
    pub phone: String,
    /// 关键页面链接
    pub pages: PageLinks,
    /// 社交媒体链接
    pub socials: SocialLinks,
    /// 检测到的技术栈
    pub technologies: Vec<String>,
    /// SEO指标
    pub seo: SeoMetrics,
    /// 页面运行时性能指标
    pub performance: PerformanceMetrics,
    /// 数据可信度评分 (0-100)
    pub confidence: u8,
    /// 线索评分 (0-100)
    pub lead_score: u8,
    /// 线索优先级
    pub priority: Priority,
    /// 抓取失败时的错误信息
    pub error: Option<String>,
}

/// 关键页面链接
///
/// 每个槽位保存首个匹配链接的绝对URL，未找到时为空字符串
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLinks {
    pub pricing: String,
    pub about: String,
    pub contact: String,
    pub blog: String,
    pub careers: String,
    pub docs: String,
}

/// 社交媒体链接
///
/// 每个平台保存页面上出现的第一个链接
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SocialLinks {
    pub twitter: String,
    pub linkedin: String,
    pub facebook: String,
    pub instagram: String,
    pub youtube: String,
    pub github: String,
}

/// SEO指标
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeoMetrics {
    /// 页面标题
    pub title: String,
    /// meta描述
    pub meta_description: String,
    /// h1标签数量
    pub h1_count: u32,
    /// 是否存在Open Graph标签
    pub has_og_tags: bool,
    /// 是否存在Twitter Card标签
    pub has_twitter_card: bool,
    /// 图片数量
    pub image_count: u32,
    /// 链接数量
    pub link_count: u32,
}

/// 页面运行时性能指标
///
/// 来自浏览器的Performance.getMetrics采样，浏览器未提供时为零值
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceMetrics {
    /// JS堆内存占用（字节）
    pub js_heap_bytes: u64,
    /// DOM节点数
    pub dom_nodes: u64,
    /// 文档数
    pub document_count: u64,
}

/// 线索优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// 根据线索评分划分优先级
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            Priority::High
        } else if score >= 40 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl ScrapedRecord {
    /// 创建一条空白记录，由提取器和评分器逐步填充
    ///
    /// # 参数
    ///
    /// * `url` - 抓取的目标URL
    ///
    /// # 返回值
    ///
    /// 返回所有字段为空值的记录实例
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scraped_at: Utc::now(),
            logo: String::new(),
            name: String::new(),
            description: String::new(),
            business_type: String::new(),
            keywords: String::new(),
            email: String::new(),
            phone: String::new(),
            pages: PageLinks::default(),
            socials: SocialLinks::default(),
            technologies: Vec::new(),
            seo: SeoMetrics::default(),
            performance: PerformanceMetrics::default(),
            confidence: 0,
            lead_score: 0,
            priority: Priority::Low,
            error: None,
        }
    }

    /// 创建一条失败记录
    ///
    /// # 参数
    ///
    /// * `url` - 抓取的目标URL
    /// * `error` - 失败原因
    ///
    /// # 返回值
    ///
    /// 返回带错误信息的记录实例
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        let mut record = Self::new(url);
        record.error = Some(error.into());
        record
    }

    /// 该记录是否为失败记录
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
