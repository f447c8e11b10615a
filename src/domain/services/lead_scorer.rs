// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_record::{Priority, ScrapedRecord};

/// 高质量联系邮箱的局部名特征
const CONTACT_EMAIL_MARKERS: [&str; 4] = ["contact", "info", "hello", "sales"];

/// 支持类邮箱的局部名特征
const SUPPORT_EMAIL_MARKERS: [&str; 2] = ["support", "admin"];

/// JS堆占用低于该值视为轻量站点
const LOW_HEAP_THRESHOLD_BYTES: u64 = 30_000_000;

/// 线索评分器
///
/// 纯函数：将提取出的信号与页面可信度折算为0-100的线索评分
/// 和优先级档位。相同输入总是产出相同评分。
pub struct LeadScorer;

impl LeadScorer {
    /// 计算线索评分并填充优先级
    ///
    /// # 参数
    ///
    /// * `record` - 已完成内容提取的记录
    ///
    /// # 返回值
    ///
    /// 返回填充了lead_score和priority的记录
    pub fn score(mut record: ScrapedRecord) -> ScrapedRecord {
        let mut score: i32 = 0;

        // Email quality
        if !record.email.is_empty() {
            if CONTACT_EMAIL_MARKERS
                .iter()
                .any(|marker| record.email.contains(marker))
            {
                score += 30;
            } else if SUPPORT_EMAIL_MARKERS
                .iter()
                .any(|marker| record.email.contains(marker))
            {
                score += 15;
            } else {
                score += 10;
            }
        }

        if !record.phone.is_empty() {
            score += 15;
        }

        // Business signals, pricing page only counts with solid confidence
        if !record.pages.pricing.is_empty() && record.confidence > 60 {
            score += 20;
        }
        match record.business_type.as_str() {
            "B2B SaaS" => score += 25,
            "Developer Platform" => score += 20,
            "E-Commerce" => score += 15,
            _ => {}
        }

        // Social presence
        if !record.socials.linkedin.is_empty() {
            score += 10;
        }
        if !record.socials.twitter.is_empty() {
            score += 5;
        }
        if !record.socials.github.is_empty() {
            score += 5;
        }

        if record.performance.js_heap_bytes < LOW_HEAP_THRESHOLD_BYTES {
            score += 10;
        }

        // SEO quality
        if record.seo.has_og_tags {
            score += 5;
        }
        if !record.seo.meta_description.is_empty() {
            score += 5;
        }

        // Confidence penalties stack
        if record.confidence < 50 {
            score -= 20;
        }
        if record.confidence < 30 {
            score -= 30;
        }

        let clamped = score.clamp(0, 100) as u8;
        record.lead_score = clamped;
        record.priority = Priority::from_score(clamped);
        record
    }
}
