// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_record::{PageLinks, ScrapedRecord, SeoMetrics, SocialLinks};
use crate::domain::services::document_view::DocumentView;
use crate::utils::url_utils::resolve_url;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use url::Url;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b")
        .expect("Failed to compile email regex")
});

// Deliberately narrow: requires separator groups so bare IDs and dates do not match
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\d{1,3}[\s.-]?\d{2,4}?[\s.-]\d{3,4}[\s.-]\d{4}")
        .expect("Failed to compile phone regex")
});

/// 角色/法务类邮箱前缀，不作为联系线索
const ROLE_EMAIL_BLOCKLIST: [&str; 9] = [
    "privacy@",
    "legal@",
    "abuse@",
    "noreply@",
    "no-reply@",
    "donotreply@",
    "postmaster@",
    "webmaster@",
    "copyright@",
];

/// 占位/示例邮箱特征子串
const PLACEHOLDER_EMAIL_BLOCKLIST: [&str; 12] = [
    "example.com",
    "domain.com",
    "email.com",
    "test.com",
    "your@",
    "name@",
    "user@",
    "info@example",
    "support@example",
    "contact@example",
    "hello@example",
    "admin@example",
];

/// 邮箱质量层级，mailto链接最高，正文扫描最低
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmailTier {
    High,
    Medium,
    Low,
}

/// 内容提取器
///
/// 对已捕获的页面HTML运行全部商业情报启发式，产出除运行时
/// 性能和线索评分外所有字段已填充的抓取记录。提取过程是
/// 纯函数式的：相同HTML总是产出相同记录。
pub struct ContentExtractor;

impl ContentExtractor {
    /// 从页面视图提取一条抓取记录
    ///
    /// # 参数
    ///
    /// * `url` - 抓取的目标URL，同时作为相对链接的解析基准
    /// * `view` - 已解析的页面视图
    ///
    /// # 返回值
    ///
    /// 返回填充了内容字段和可信度的记录，性能指标和评分由调用方补齐
    pub fn extract(url: &str, view: &DocumentView) -> ScrapedRecord {
        let base = Url::parse(url).ok();
        let mut record = ScrapedRecord::new(url);
        record.logo = Self::logo(view, base.as_ref());
        record.name = Self::company_name(view);
        record.description = Self::company_description(view);
        record.business_type = Self::business_type(view);
        record.keywords = Self::meta_keywords(view);
        record.email = Self::best_email(view);
        record.phone = Self::phone_number(view);
        record.pages = PageLinks {
            pricing: Self::find_page(view, base.as_ref(), "pricing"),
            about: Self::find_page(view, base.as_ref(), "about"),
            contact: Self::find_page(view, base.as_ref(), "contact"),
            blog: Self::find_page(view, base.as_ref(), "blog"),
            careers: Self::find_page(view, base.as_ref(), "career"),
            docs: Self::find_page(view, base.as_ref(), "docs"),
        };
        record.socials = Self::social_links(view);
        record.technologies = Self::technologies(view);
        record.seo = Self::seo_metrics(view);
        record.confidence = Self::confidence(view);
        record
    }

    /// 查找Logo图片并解析为绝对URL
    fn logo(view: &DocumentView, base: Option<&Url>) -> String {
        let mut src = view
            .first_attr(
                "img[src*='logo'], img[alt*='logo'], .logo img, [class*='logo'] img",
                "src",
            )
            .unwrap_or_default();

        if src.is_empty() {
            src = view
                .first_attr("meta[property='og:image']", "content")
                .unwrap_or_default();
        }

        if !src.is_empty() && !src.starts_with("http") {
            src = match base.and_then(|base| resolve_url(base, &src).ok()) {
                Some(resolved) => resolved.to_string(),
                None => String::new(),
            };
        }
        src
    }

    /// 公司名称：og:site_name、application-name、标题首段，最后回退到固定值
    fn company_name(view: &DocumentView) -> String {
        if let Some(name) = view
            .first_attr("meta[property='og:site_name']", "content")
            .filter(|content| !content.is_empty())
        {
            return name;
        }
        if let Some(name) = view
            .first_attr("meta[name='application-name']", "content")
            .filter(|content| !content.is_empty())
        {
            return name;
        }

        let title = view.first_text("title").unwrap_or_default();
        let leading = title
            .split('|')
            .next()
            .unwrap_or("")
            .split('-')
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        if leading.is_empty() {
            "company".to_string()
        } else {
            leading
        }
    }

    fn company_description(view: &DocumentView) -> String {
        view.first_attr("meta[name='description']", "content")
            .filter(|content| !content.is_empty())
            .or_else(|| view.first_attr("meta[property='og:description']", "content"))
            .unwrap_or_default()
    }

    fn meta_keywords(view: &DocumentView) -> String {
        view.first_attr("meta[name='keywords']", "content")
            .unwrap_or_default()
    }

    fn seo_metrics(view: &DocumentView) -> SeoMetrics {
        SeoMetrics {
            title: view.first_text("title").unwrap_or_default(),
            meta_description: view
                .first_attr("meta[name='description']", "content")
                .unwrap_or_default(),
            h1_count: view.count_matching("h1") as u32,
            has_og_tags: view.count_matching("meta[property^='og:']") > 0,
            has_twitter_card: view.count_matching("meta[name^='twitter:']") > 0,
            image_count: view.count_matching("img") as u32,
            link_count: view.count_matching("a") as u32,
        }
    }

    /// 定位首个链接地址包含关键词的页面链接
    ///
    /// 绝对链接原样返回；根相对链接在有基准URL时解析为绝对地址；
    /// 其余情况返回空字符串
    fn find_page(view: &DocumentView, base: Option<&Url>, keyword: &str) -> String {
        let selector = format!("a[href*='{}']", keyword);
        let href = match view.first_attr(&selector, "href") {
            Some(href) if !href.is_empty() => href,
            _ => return String::new(),
        };
        if href.starts_with("http") {
            return href;
        }
        if href.starts_with('/') {
            if let Some(resolved) = base.and_then(|base| resolve_url(base, &href).ok()) {
                return resolved.to_string();
            }
        }
        String::new()
    }

    /// 每个平台记录页面上出现的第一个社交链接
    fn social_links(view: &DocumentView) -> SocialLinks {
        let mut socials = SocialLinks::default();

        for anchor in view.all_matching("a") {
            let href = anchor.value().attr("href").unwrap_or_default();
            if (href.contains("twitter.com") || href.contains("x.com"))
                && socials.twitter.is_empty()
            {
                socials.twitter = href.to_string();
            }
            if href.contains("linkedin.com") && socials.linkedin.is_empty() {
                socials.linkedin = href.to_string();
            }
            if href.contains("facebook.com") && socials.facebook.is_empty() {
                socials.facebook = href.to_string();
            }
            if href.contains("instagram.com") && socials.instagram.is_empty() {
                socials.instagram = href.to_string();
            }
            if href.contains("youtube.com") && socials.youtube.is_empty() {
                socials.youtube = href.to_string();
            }
            if href.contains("github.com") && socials.github.is_empty() {
                socials.github = href.to_string();
            }
        }

        socials
    }

    /// 按固定顺序检测技术栈标记
    fn technologies(view: &DocumentView) -> Vec<String> {
        let mut tech: Vec<&str> = Vec::new();

        // Framework detection
        if view.contains("__NEXT_DATA__") || view.contains("_next/static") {
            tech.push("Next.js");
        }
        if view.contains("data-reactroot") || view.contains("data-react") || view.contains("__REACT")
        {
            tech.push("React");
        }
        if view.contains("__NUXT__") || view.contains("_nuxt/") {
            tech.push("Nuxt.js");
        }
        if view.contains("ng-version") || view.count_matching("[ng-version]") > 0 {
            tech.push("Angular");
        }

        // CMS detection
        let wordpress_generator = view
            .first_attr("meta[name='generator']", "content")
            .map(|content| content.contains("WordPress"))
            .unwrap_or(false);
        if view.contains("wp-content") || view.contains("wp-json") || wordpress_generator {
            tech.push("WordPress");
        }
        if view.contains("shopify") || view.contains("cdn.shopify.com") {
            tech.push("Shopify");
        }
        if view.contains("wix.com") || view.contains("parastorage.com") {
            tech.push("Wix");
        }
        if view.contains("squarespace") {
            tech.push("Squarespace");
        }

        // Hosting platforms
        if view.count_matching("meta[name='vercel-deployment-id']") > 0 || view.contains("_vercel")
        {
            tech.push("Vercel");
        }
        if view.contains("netlify") || view.count_matching("meta[name='netlify']") > 0 {
            tech.push("Netlify");
        }

        // Analytics
        if view.contains("google-analytics") || view.contains("gtag") {
            tech.push("Google Analytics");
        }
        if view.contains("plausible") {
            tech.push("Plausible");
        }

        tech.into_iter().map(|name| name.to_string()).collect()
    }

    /// 加权打分推断业务类型，最高分超过阈值才采纳，否则归为通用类型
    fn business_type(view: &DocumentView) -> String {
        let body = view.body_text().to_lowercase();
        let title = view.first_text("title").unwrap_or_default().to_lowercase();
        let description = view
            .first_attr("meta[name='description']", "content")
            .map(|content| content.to_lowercase())
            .unwrap_or_default();
        let full_text = format!("{} {} {}", body, title, description);
        let has = |needle: &str| full_text.contains(needle);

        let mut developer_platform = 0;
        if (has("api") && (has("docs") || has("documentation")))
            || !Self::find_page(view, None, "docs").is_empty()
        {
            developer_platform += 40;
        }
        if has("sdk") || has("developer") {
            developer_platform += 20;
        }

        let mut b2b_saas = 0;
        if has("enterprise") || has("teams") {
            b2b_saas += 30;
        }
        if has("sso") || has("compliance") {
            b2b_saas += 25;
        }
        if has("dashboard") && has("analytics") {
            b2b_saas += 20;
        }

        let mut consumer_saas = 0;
        if has("free trial") && !has("enterprise") {
            consumer_saas += 25;
        }
        if has("sign up") && has("month") {
            consumer_saas += 20;
        }

        let mut ecommerce = 0;
        if has("add to cart") || has("shop now") {
            ecommerce += 50;
        }
        if has("checkout") || has("free shipping") {
            ecommerce += 30;
        }
        if view.count_matching("[class*='product']") > 5 {
            ecommerce += 20;
        }

        let mut service_business = 0;
        if has("book appointment") || has("schedule consultation") {
            service_business += 40;
        }
        if has("contact us") && has("quote") {
            service_business += 20;
        }

        let mut edtech = 0;
        if has("courses") || has("students") {
            edtech += 35;
        }
        if has("learn") && has("certification") {
            edtech += 25;
        }

        // Portfolio language alone is too common on blogs, require a commercial page
        let mut agency = 0;
        if has("portfolio")
            && has("clients")
            && (!Self::find_page(view, None, "pricing").is_empty()
                || !Self::find_page(view, None, "contact").is_empty())
        {
            agency += 35;
        }
        if has("case studies") || has("our work") {
            agency += 25;
        }

        let mut media_blog = 0;
        if view.count_matching("article") > 3 {
            media_blog += 40;
        }
        if has("subscribe") && has("newsletter") {
            media_blog += 20;
        }

        let categories: [(&str, i32); 8] = [
            ("Developer Platform", developer_platform),
            ("B2B SaaS", b2b_saas),
            ("Consumer SaaS", consumer_saas),
            ("E-Commerce", ecommerce),
            ("Service Business", service_business),
            ("EdTech", edtech),
            ("Agency", agency),
            ("Media/Blog", media_blog),
        ];

        let (mut best_name, mut best_score) = categories[0];
        for (name, score) in categories.into_iter().skip(1) {
            if score > best_score {
                best_name = name;
                best_score = score;
            }
        }

        if best_score > 20 {
            best_name.to_string()
        } else {
            "General Business".to_string()
        }
    }

    /// 三级优先提取联系邮箱：mailto链接、联系区块文本、正文扫描
    fn best_email(view: &DocumentView) -> String {
        let mut ordered: Vec<String> = Vec::new();
        let mut quality: HashMap<String, EmailTier> = HashMap::new();

        // mailto links carry the strongest signal
        for anchor in view.all_matching("a[href^='mailto:']") {
            let href = match anchor.value().attr("href") {
                Some(href) => href,
                None => continue,
            };
            let without_scheme = match href.get(..7) {
                Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &href[7..],
                _ => href,
            };
            let email = without_scheme
                .split('?')
                .next()
                .unwrap_or("")
                .trim()
                .to_lowercase();
            if email.is_empty() {
                continue;
            }
            if ROLE_EMAIL_BLOCKLIST
                .iter()
                .any(|blocked| email.starts_with(blocked))
            {
                continue;
            }
            if !quality.contains_key(&email) {
                ordered.push(email.clone());
            }
            quality.insert(email, EmailTier::High);
        }

        // Contact sections, footers excluded
        let contact_text = Self::contact_section_text(view);
        for matched in EMAIL_REGEX.find_iter(&contact_text) {
            let email = matched.as_str().to_lowercase();
            if ROLE_EMAIL_BLOCKLIST
                .iter()
                .any(|blocked| email.starts_with(blocked))
            {
                continue;
            }
            if !quality.contains_key(&email) {
                quality.insert(email.clone(), EmailTier::Medium);
                ordered.push(email);
            }
        }

        // Whole-body sweep as the weakest tier
        let body_text = view.body_text_excluding("footer");
        for matched in EMAIL_REGEX.find_iter(&body_text) {
            let email = matched.as_str().to_lowercase();
            if ROLE_EMAIL_BLOCKLIST
                .iter()
                .any(|blocked| email.starts_with(blocked))
            {
                continue;
            }
            if !quality.contains_key(&email) {
                quality.insert(email.clone(), EmailTier::Low);
                ordered.push(email);
            }
        }

        let valid: Vec<&String> = ordered
            .iter()
            .filter(|email| {
                !PLACEHOLDER_EMAIL_BLOCKLIST
                    .iter()
                    .any(|blocked| email.contains(blocked))
            })
            .collect();

        for tier in [EmailTier::High, EmailTier::Medium] {
            if let Some(email) = valid.iter().find(|email| quality.get(**email) == Some(&tier)) {
                return (*email).clone();
            }
        }
        valid.first().map(|email| (*email).clone()).unwrap_or_default()
    }

    /// 收集联系区块的文本：含"Contact"字样的section/div，
    /// 以及id或class为contact的元素，跳过footer内的内容
    fn contact_section_text(view: &DocumentView) -> String {
        let mut text = String::new();

        for element in view.all_matching("section, div, #contact, .contact") {
            let value = element.value();
            if value.name() == "footer" || DocumentView::has_ancestor(element, "footer") {
                continue;
            }

            let element_text = DocumentView::element_text_excluding(element, "footer");
            let contact_marked = value.id() == Some("contact")
                || value.classes().any(|class| class == "contact");
            let contact_section = (value.name() == "section" || value.name() == "div")
                && element_text.contains("Contact");

            if contact_marked || contact_section {
                text.push_str(&element_text);
            }
        }

        text
    }

    /// 正文中首个符合电话模式的匹配，空白压缩为单个空格
    fn phone_number(view: &DocumentView) -> String {
        let body = view.body_text();
        match PHONE_REGEX.find(&body) {
            Some(matched) => matched
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }

    /// 页面可信度评分，聚合内容质量、导航、联系方式和SEO信号
    fn confidence(view: &DocumentView) -> u8 {
        let mut confidence: i32 = 0;

        // A real headline, neither a stub nor a paragraph
        let h1 = view
            .first_text("h1")
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        let h1_len = h1.chars().count();
        if !h1.is_empty() && h1_len > 10 && h1_len < 100 {
            confidence += 15;
        }

        let body = view.body_text();
        let body_len = body.trim().chars().count();
        if body_len > 2000 {
            confidence += 20;
        }
        if body_len > 5000 {
            confidence += 10;
        }

        if !Self::find_page(view, None, "pricing").is_empty() {
            confidence += 15;
        }

        let bot_challenge =
            view.contains("cf-browser-verification") || view.contains("Just a moment");
        if bot_challenge {
            confidence -= 30;
        }

        if view.count_matching("nav") > 0 || view.count_matching("header a") > 3 {
            confidence += 10;
        }

        if view.count_matching("a[href^='mailto:']") > 0 {
            confidence += 10;
        }
        if view.count_matching("a[href^='tel:']") > 0 {
            confidence += 5;
        }

        if view
            .first_attr("meta[name='description']", "content")
            .map(|content| !content.is_empty())
            .unwrap_or(false)
        {
            confidence += 10;
        }
        if view.count_matching("meta[property^='og:']") > 0 {
            confidence += 5;
        }

        confidence.clamp(0, 100) as u8
    }
}

#[cfg(test)]
#[path = "content_extractor_test.rs"]
mod tests;
