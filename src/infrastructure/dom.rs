//! 文档规整器 - 基础设施层
//!
//! 持有解析后的 DOM 树（`scraper::Html`），只对外暴露"选择节点"和"取规整文本"两种能力。
//! `Html` 不是 `Send`，所以整篇文档的处理必须在同一个线程里同步完成。

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| sel("script"));

/// 编译静态选择器（只用于源码里的常量选择器）
pub fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("非法的内置选择器 {css:?}: {e:?}"))
}

/// 已解析的试卷页面
pub struct ExamPage {
    html: Html,
}

impl ExamPage {
    /// 解析原始 HTML（容错解析，不会失败）
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// 按候选顺序返回第一个命中的节点
    pub fn first_match<'a>(&'a self, candidates: &[&Selector]) -> Option<ElementRef<'a>> {
        candidates
            .iter()
            .find_map(|selector| self.html.select(selector).next())
    }

    /// 所有内联脚本的原始文本
    pub fn scripts(&self) -> Vec<String> {
        self.html
            .select(&SCRIPT)
            .map(|script| script.text().collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .collect()
    }
}

/// 渲染时对单个元素的处理方式
pub enum Render {
    /// 正常下钻子节点
    Descend,
    /// 整个元素不输出
    Skip,
    /// 用给定文本替代整个元素
    Replace(String),
}

/// 元素的单行文本：去掉标记，空白折叠为单个空格
pub fn inline_text(el: ElementRef<'_>) -> String {
    inline_text_with(el, &mut |_| Render::Descend)
}

/// 同 [`inline_text`]，但允许调用方替换或跳过特定元素
pub fn inline_text_with(
    el: ElementRef<'_>,
    hook: &mut dyn FnMut(ElementRef<'_>) -> Render,
) -> String {
    let mut buffer = String::new();
    push_inline(el, hook, &mut buffer);
    collapse_whitespace(&buffer)
}

fn push_inline(
    el: ElementRef<'_>,
    hook: &mut dyn FnMut(ElementRef<'_>) -> Render,
    buffer: &mut String,
) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => buffer.push_str(text),
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_hidden_content(child_el) {
                    continue;
                }
                match hook(child_el) {
                    Render::Skip => {}
                    Render::Replace(text) => buffer.push_str(&text),
                    Render::Descend => {
                        if child_el.value().name() == "br" || is_block(child_el) {
                            buffer.push(' ');
                        }
                        push_inline(child_el, hook, buffer);
                        if is_block(child_el) {
                            buffer.push(' ');
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// 元素的多行文本：块级子元素和 `<br>` 各占一行，行内空白折叠，空行丢弃
pub fn block_text(el: ElementRef<'_>) -> String {
    block_text_with(el, &mut |_| Render::Descend)
}

/// 同 [`block_text`]，但允许调用方替换或跳过特定元素
pub fn block_text_with(
    el: ElementRef<'_>,
    hook: &mut dyn FnMut(ElementRef<'_>) -> Render,
) -> String {
    let mut lines = vec![String::new()];
    push_block(el, hook, &mut lines);
    lines
        .iter()
        .map(|line| collapse_whitespace(line))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_block(
    el: ElementRef<'_>,
    hook: &mut dyn FnMut(ElementRef<'_>) -> Render,
    lines: &mut Vec<String>,
) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                if let Some(line) = lines.last_mut() {
                    line.push_str(text);
                }
            }
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_hidden_content(child_el) {
                    continue;
                }
                match hook(child_el) {
                    Render::Skip => continue,
                    Render::Replace(text) => {
                        if let Some(line) = lines.last_mut() {
                            line.push_str(&text);
                        }
                        continue;
                    }
                    Render::Descend => {}
                }
                if child_el.value().name() == "br" {
                    lines.push(String::new());
                    continue;
                }
                let block = is_block(child_el);
                if block {
                    lines.push(String::new());
                }
                push_block(child_el, hook, lines);
                if block {
                    lines.push(String::new());
                }
            }
            _ => {}
        }
    }
}

/// 空白折叠：连续空白（含不间断空格）变成一个空格，并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn tag(el: ElementRef<'_>) -> &str {
    el.value().name()
}

/// 直接子元素
pub fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children().filter_map(ElementRef::wrap)
}

/// 向上查找最近的满足条件的祖先（不含自身），遇到 `stop` 即停止
pub fn closest<'a>(
    el: ElementRef<'a>,
    stop: ElementRef<'a>,
    predicate: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    let mut current = el.parent().and_then(ElementRef::wrap);
    while let Some(node) = current {
        if node.id() == stop.id() {
            return None;
        }
        if predicate(node) {
            return Some(node);
        }
        current = node.parent().and_then(ElementRef::wrap);
    }
    None
}

/// `el` 是否是 `ancestor` 的后代
pub fn is_descendant_of(el: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    el.ancestors().any(|node| node.id() == ancestor.id())
}

fn is_hidden_content(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "script" | "style" | "noscript" | "template")
}

fn is_block(el: ElementRef<'_>) -> bool {
    matches!(
        el.value().name(),
        "p" | "div"
            | "section"
            | "article"
            | "li"
            | "ul"
            | "ol"
            | "table"
            | "tr"
            | "td"
            | "th"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
    )
}
