//! 文章提取服务 - 业务能力层
//!
//! 只负责从文章区域取出标题和有序段落，另外记录"题号 → 段落标签"的标题匹配目标

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::infrastructure::dom::{
    attr, block_text_with, child_elements, has_class, inline_text, sel, tag, ExamPage, Render,
};
use crate::models::{Paragraph, Passage};

static PASSAGE_CONTAINERS: LazyLock<[Selector; 4]> = LazyLock::new(|| {
    [
        sel("section#left"),
        sel("div#passage-pane"),
        sel("section.passage-pane"),
        sel("div.passage-pane"),
    ]
});
static TITLE: LazyLock<[Selector; 3]> = LazyLock::new(|| [sel("h3"), sel("h2"), sel("h1")]);
static WRAPPER: LazyLock<Selector> = LazyLock::new(|| sel("div.paragraph-wrapper"));
static DROPZONE: LazyLock<Selector> = LazyLock::new(|| sel("div.paragraph-dropzone"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| sel("strong, b"));

static DIFFICULTY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"【[^】]*】|\[\s*(?:P[123]|高|中|低|难|易)[^\]]*\]|[（(]\s*(?:高|中|低|难|易)\s*[)）]")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static RESIDUAL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap_or_else(|e| panic!("内置正则非法: {e}")));
static PARAGRAPH_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Z]|[IVXLC]+)$").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static PARAGRAPH_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Paragraph\s+([A-Z]+)").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static ANCHOR_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"q(\d+)").unwrap_or_else(|e| panic!("内置正则非法: {e}")));

/// 文章提取结果
#[derive(Debug, Clone)]
pub struct PassageExtraction {
    pub passage: Passage,
    /// 标题匹配题的目标段落：题号 → 段落标签
    pub heading_targets: BTreeMap<u32, String>,
}

/// 提取文章标题与段落
pub fn extract(page: &ExamPage) -> PipelineResult<PassageExtraction> {
    let containers: Vec<&Selector> = PASSAGE_CONTAINERS.iter().collect();
    let container = page
        .first_match(&containers)
        .ok_or_else(|| PipelineError::extraction(None, "passage", "未找到文章区域 (#left)"))?;

    let title_el = TITLE
        .iter()
        .find_map(|selector| container.select(selector).next())
        .ok_or_else(|| PipelineError::extraction(None, "passage.title", "文章区域没有标题"))?;
    let title = clean_title(&inline_text(title_el));
    if title.is_empty() {
        return Err(PipelineError::extraction(None, "passage.title", "标题为空"));
    }

    let mut paragraphs = Vec::new();
    collect_paragraphs(container, title_el, &mut paragraphs);
    let heading_targets = collect_heading_targets(container);

    debug!(
        "文章 {:?}: {} 个段落, {} 个标题匹配目标",
        title,
        paragraphs.len(),
        heading_targets.len()
    );

    Ok(PassageExtraction {
        passage: Passage { title, paragraphs },
        heading_targets,
    })
}

/// 去掉难度标记与残留标签
pub fn clean_title(raw: &str) -> String {
    let without_marker = DIFFICULTY_MARKER.replace_all(raw, " ");
    let without_tags = RESIDUAL_TAG.replace_all(&without_marker, " ");
    without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, '-' | '–' | '—' | ':' | '：' | '|') || c.is_whitespace())
        .to_string()
}

/// 段落标签是否合法（单个大写字母或大写罗马数字）
pub fn is_paragraph_label(label: &str) -> bool {
    PARAGRAPH_LABEL.is_match(label)
}

fn is_stop_marker(el: ElementRef<'_>) -> bool {
    has_class(el, "empty-space")
        || has_class(el, "practice-nav")
        || attr(el, "id") == Some("divider")
        || attr(el, "id") == Some("right")
}

/// 按文档顺序收集段落，遇到分隔标记即停止；返回是否已停止
fn collect_paragraphs(
    node: ElementRef<'_>,
    title_el: ElementRef<'_>,
    out: &mut Vec<Paragraph>,
) -> bool {
    for child in child_elements(node) {
        if is_stop_marker(child) {
            return true;
        }
        if child.id() == title_el.id() {
            continue;
        }

        match tag(child) {
            "p" => push_paragraph(child, out),
            "div" if has_class(child, "paragraph-wrapper") => push_paragraph(child, out),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let content = inline_text(child);
                if !content.is_empty() {
                    out.push(Paragraph {
                        label: None,
                        content,
                    });
                }
            }
            "div" | "section" | "article" | "main" | "blockquote" => {
                if collect_paragraphs(child, title_el, out) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

fn push_paragraph(block: ElementRef<'_>, out: &mut Vec<Paragraph>) {
    let label = resolve_label(block);
    let text = block_text_with(block, &mut |child| {
        if has_class(child, "paragraph-dropzone") || has_class(child, "drop-zone") {
            Render::Skip
        } else {
            Render::Descend
        }
    });
    let content = match &label {
        Some(label) => strip_leading_label(&text, label),
        None => text,
    };
    if content.is_empty() {
        return;
    }
    out.push(Paragraph { label, content });
}

fn resolve_label(block: ElementRef<'_>) -> Option<String> {
    let from_attr = block
        .select(&DROPZONE)
        .find_map(|dropzone| attr(dropzone, "data-paragraph"))
        .or_else(|| attr(block, "data-label"))
        .or_else(|| attr(block, "data-paragraph"))
        .map(str::to_string);

    from_attr
        .or_else(|| leading_strong_label(block))
        .map(|label| label.trim().to_string())
        .filter(|label| is_paragraph_label(label))
}

/// 块首个 `<strong>`/`<b>` 若是段落标签则返回
fn leading_strong_label(block: ElementRef<'_>) -> Option<String> {
    let strong = block.select(&STRONG).next()?;
    let label = inline_text(strong);
    if !is_paragraph_label(&label) {
        return None;
    }
    let text = inline_text(block);
    text.starts_with(&label).then_some(label)
}

fn strip_leading_label(text: &str, label: &str) -> String {
    let Some(rest) = text.strip_prefix(label) else {
        return text.to_string();
    };
    if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace() || ".-):：".contains(c)) {
        return text.to_string();
    }
    rest.trim_start_matches(|c: char| c.is_whitespace() || ".-):：".contains(c))
        .to_string()
}

fn collect_heading_targets(container: ElementRef<'_>) -> BTreeMap<u32, String> {
    let mut targets = BTreeMap::new();
    for wrapper in container.select(&WRAPPER) {
        let Some(number) = attr(wrapper, "id")
            .and_then(|id| ANCHOR_NUMBER.captures(id))
            .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        else {
            continue;
        };

        let label = wrapper
            .select(&DROPZONE)
            .next()
            .and_then(|dropzone| {
                attr(dropzone, "data-paragraph").map(str::to_string).or_else(|| {
                    PARAGRAPH_SPAN
                        .captures(&inline_text(dropzone))
                        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                })
            })
            .or_else(|| wrapper.select(&STRONG).next().map(inline_text))
            .filter(|label| !label.is_empty());

        if let Some(label) = label {
            targets.insert(number, label);
        }
    }
    targets
}
