// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{ElementRef, Html, Node, Selector};

/// 已解析页面的类型化视图
///
/// 将DOM查询收敛为少量类型化访问器，提取启发式只依赖本视图，
/// 不直接接触底层HTML解析库。同时保留原始HTML文本用于子串匹配。
///
/// 注意：内部的解析树不是Send，使用方必须在同步作用域内
/// 完成全部查询，不得跨await持有本视图。
pub struct DocumentView {
    raw: String,
    html: Html,
}

impl DocumentView {
    /// 解析原始HTML构建视图
    pub fn parse(raw: String) -> Self {
        let html = Html::parse_document(&raw);
        Self { raw, html }
    }

    /// 原始HTML文本
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 原始HTML是否包含给定子串（大小写敏感）
    pub fn contains(&self, needle: &str) -> bool {
        self.raw.contains(needle)
    }

    /// 首个匹配选择器的元素
    ///
    /// 选择器非法时返回None
    pub fn first_matching(&self, selector: &str) -> Option<ElementRef<'_>> {
        let parsed = Selector::parse(selector).ok()?;
        self.html.select(&parsed).next()
    }

    /// 所有匹配选择器的元素
    ///
    /// 选择器非法时返回空列表
    pub fn all_matching(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(parsed) => self.html.select(&parsed).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// 匹配选择器的元素数量
    pub fn count_matching(&self, selector: &str) -> usize {
        match Selector::parse(selector) {
            Ok(parsed) => self.html.select(&parsed).count(),
            Err(_) => 0,
        }
    }

    /// 首个匹配元素的指定属性值
    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.first_matching(selector)
            .and_then(|element| element.value().attr(attr))
            .map(|value| value.to_string())
    }

    /// 首个匹配元素的文本内容
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.first_matching(selector)
            .map(|element| element.text().collect::<String>())
    }

    /// body的全部文本内容
    pub fn body_text(&self) -> String {
        self.first_matching("body")
            .map(|body| body.text().collect::<String>())
            .unwrap_or_default()
    }

    /// body的文本内容，跳过指定标签的整棵子树
    pub fn body_text_excluding(&self, excluded_tag: &str) -> String {
        self.first_matching("body")
            .map(|body| Self::element_text_excluding(body, excluded_tag))
            .unwrap_or_default()
    }

    /// 元素的文本内容，跳过指定标签的整棵子树
    pub fn element_text_excluding(element: ElementRef<'_>, excluded_tag: &str) -> String {
        let mut text = String::new();
        collect_text_excluding(element, excluded_tag, &mut text);
        text
    }

    /// 元素是否位于指定标签的子树内
    pub fn has_ancestor(element: ElementRef<'_>, tag: &str) -> bool {
        element
            .ancestors()
            .filter_map(|node| node.value().as_element())
            .any(|ancestor| ancestor.name() == tag)
    }
}

fn collect_text_excluding(element: ElementRef<'_>, excluded_tag: &str, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(child_element) if child_element.name() != excluded_tag => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text_excluding(child_ref, excluded_tag, out);
                }
            }
            _ => {}
        }
    }
}
