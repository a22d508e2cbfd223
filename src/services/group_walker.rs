//! 题组遍历服务 - 业务能力层
//!
//! 按文档顺序遍历题目区域中的每个题组，产出与 DOM 解耦的 `QuestionNode` 描述：
//! 题号、控件形状、所在块的结构形状、题干文本、选项、是否可重复使用。
//! 题型判断不在这里做，见 `type_classifier`。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node, Selector};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::infrastructure::dom::{
    attr, block_text, child_elements, closest, has_class, inline_text, inline_text_with, sel, tag,
    ExamPage, Render,
};
use crate::models::ChoiceOption;

/// 当前空位在题干中的标记
pub const BLANK: &str = "_____";

/// 题目条目 class
const CHOICE_ITEM_CLASSES: [&str; 5] = [
    "question-item",
    "tfng-item",
    "yn-item",
    "mcq-item",
    "choice-item",
];

/// 出现这些 class 的直接子元素意味着说明文字结束
const STRUCTURAL_CLASSES: [&str; 10] = [
    "question-item",
    "tfng-item",
    "yn-item",
    "mcq-item",
    "choice-item",
    "match-question-item",
    "options-pool",
    "headings-pool",
    "summary-completion",
    "notes-completion",
];

static QUESTION_CONTAINERS: LazyLock<[Selector; 4]> = LazyLock::new(|| {
    [
        sel("section#right"),
        sel("div#questions-pane"),
        sel("section.questions-pane"),
        sel("div.questions-pane"),
    ]
});
static GROUP: LazyLock<Selector> = LazyLock::new(|| sel("div.group"));
static HEADER: LazyLock<Selector> = LazyLock::new(|| sel("h4"));
static POOL: LazyLock<Selector> = LazyLock::new(|| sel("div.options-pool, div.headings-pool"));
static DRAG_ITEM: LazyLock<Selector> = LazyLock::new(|| sel(".drag-item"));
/// 一篇阅读最多 40 题，单个节点的题号跨度不会超过它
const MAX_NUMBER_SPAN: u32 = 40;

/// 说明文字中表示选项可重复使用的措辞
const REUSE_PHRASES: [&str; 3] = ["more than once", "may use any letter", "may use any heading"];

static INPUT: LazyLock<Selector> = LazyLock::new(|| sel("input, textarea"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| sel("label"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| sel("strong, b"));
static PARA: LazyLock<Selector> = LazyLock::new(|| sel("p"));
static ROW: LazyLock<Selector> = LazyLock::new(|| sel("tr"));

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Questions?\s+(\d+)(?:\s*(?:[–\-—]|to|and)\s*(\d+))?")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static NUMBER_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)(?:\s*(?:[–\-—]|and|&)\s*(\d+))?")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static INPUT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^q?(\d+)(?:[_\-]\d+)?$").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static LETTERED_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]|[ivxlc]+)(?:[.)]\s*|\s+)(.+)$")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});

/// 节点在文档中的位置（题组序号、组内序号，均从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePosition {
    pub group: usize,
    pub item: usize,
}

impl fmt::Display for NodePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "第 {} 组第 {} 个节点", self.group, self.item)
    }
}

/// 交互控件形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// 单选（radio）
    ChooseOne,
    /// 多选（checkbox）
    ChooseMany,
    /// 自由输入（text input）
    FreeText,
    /// 拖拽配对 / 匹配表格
    Pairing,
}

/// 节点所在块的结构形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    /// 独立题目条目
    Item,
    /// `table.matching-table` 的一行
    Grid,
    /// 文章中的标题匹配目标段落
    HeadingTarget,
    /// 普通表格中的空
    Table,
    /// 列表 / 笔记中的空
    List,
    /// 多句段落（或摘要块）中的空
    Summary,
    /// 单句中的空
    Sentence,
    /// 题干之外的独立输入框
    Detached,
}

/// 选项池类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Options,
    Headings,
}

/// 单个题目节点
#[derive(Debug, Clone)]
pub struct QuestionNode {
    pub position: NodePosition,
    /// 节点上标注的题号（多选题可能是一个区间）
    pub numbers: Vec<u32>,
    pub control: Control,
    pub block: BlockShape,
    /// 题干文本；填空题中当前空为 `_____`，其他空为 `(题号)`
    pub prompt: String,
    /// 节点自身选项，拖拽题为选项池选项
    pub options: Vec<ChoiceOption>,
    pub pool: Option<PoolKind>,
    /// 段落标签（标题匹配题）
    pub target_label: Option<String>,
    pub can_reuse: bool,
}

impl QuestionNode {
    pub fn first_number(&self) -> Option<u32> {
        self.numbers.first().copied()
    }
}

/// 题组
#[derive(Debug, Clone)]
pub struct QuestionGroup {
    pub index: usize,
    pub instruction: String,
    /// 组头 "Questions a–b" 声明的题号区间
    pub range: Option<(u32, u32)>,
    pub nodes: Vec<QuestionNode>,
}

/// 遍历题目区域的所有题组
pub fn walk(
    page: &ExamPage,
    heading_targets: &BTreeMap<u32, String>,
) -> PipelineResult<Vec<QuestionGroup>> {
    let containers: Vec<&Selector> = QUESTION_CONTAINERS.iter().collect();
    let container = page
        .first_match(&containers)
        .ok_or_else(|| PipelineError::extraction(None, "questions", "未找到题目区域 (#right)"))?;

    let mut groups = Vec::new();
    for (idx, group_el) in container.select(&GROUP).enumerate() {
        let group = GroupWalker::new(idx + 1, group_el).walk(heading_targets)?;
        debug!(
            "题组 {}: 区间 {:?}, {} 个节点",
            group.index,
            group.range,
            group.nodes.len()
        );
        groups.push(group);
    }

    if groups.is_empty() {
        return Err(PipelineError::extraction(None, "questions", "题目区域中没有题组"));
    }
    Ok(groups)
}

/// 单个题组的遍历状态
struct GroupWalker<'a> {
    index: usize,
    group: ElementRef<'a>,
    instruction: String,
    pool: Option<(PoolKind, Vec<ChoiceOption>)>,
    reuse: bool,
    consumed: Vec<ElementRef<'a>>,
    nodes: Vec<QuestionNode>,
}

impl<'a> GroupWalker<'a> {
    fn new(index: usize, group: ElementRef<'a>) -> Self {
        let pool_el = group.select(&POOL).next();
        let pool = pool_el.map(read_pool);
        let instruction = gather_instruction(group);
        let reuse = reuse_flag(group)
            || pool_el.is_some_and(reuse_flag)
            || instruction_allows_reuse(&instruction);

        let consumed: Vec<ElementRef<'a>> = pool_el.into_iter().collect();

        Self {
            index,
            group,
            instruction,
            pool,
            reuse,
            consumed,
            nodes: Vec::new(),
        }
    }

    fn walk(mut self, heading_targets: &BTreeMap<u32, String>) -> PipelineResult<QuestionGroup> {
        let range = group_range(self.group);
        let group = self.group;

        for node in group.descendants().skip(1) {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            if self.is_consumed(el) {
                continue;
            }

            if tag(el) == "table" && has_class(el, "matching-table") {
                self.consumed.push(el);
                self.push_grid_rows(el)?;
            } else if has_class(el, "match-question-item") {
                self.consumed.push(el);
                self.push_match_item(el)?;
            } else if has_class(el, "explanation") {
                self.consumed.push(el);
            } else if is_choice_item(el) && has_choice_controls(el) {
                self.consumed.push(el);
                self.push_choice_item(el)?;
            } else if is_choice_item(el) && el.select(&INPUT).next().is_none() {
                // 没有控件的判断题条目：选项由说明文字推断
                self.consumed.push(el);
                self.push_choice_item(el)?;
            } else if is_text_input(el) {
                self.push_blank(el)?;
            }
        }

        let has_pairing = self.nodes.iter().any(|n| n.control == Control::Pairing);
        if !has_pairing && matches!(self.pool, Some((PoolKind::Headings, _))) {
            self.push_heading_targets(range, heading_targets);
        }

        Ok(QuestionGroup {
            index: self.index,
            instruction: self.instruction,
            range,
            nodes: self.nodes,
        })
    }

    fn is_consumed(&self, el: ElementRef<'_>) -> bool {
        self.consumed.iter().any(|c| {
            c.id() == el.id() || el.ancestors().any(|a| a.id() == c.id())
        })
    }

    fn next_position(&self) -> NodePosition {
        NodePosition {
            group: self.index,
            item: self.nodes.len() + 1,
        }
    }

    fn pool_kind(&self) -> Option<PoolKind> {
        self.pool.as_ref().map(|(kind, _)| *kind)
    }

    fn pool_options(&self) -> Vec<ChoiceOption> {
        self.pool
            .as_ref()
            .map(|(_, options)| options.clone())
            .unwrap_or_default()
    }

    fn missing_number(&self, what: &str) -> PipelineError {
        PipelineError::extraction(
            None,
            "questionNumber",
            format!("{} 的{}没有可识别的题号", self.next_position(), what),
        )
    }

    fn push_grid_rows(&mut self, table: ElementRef<'a>) -> PipelineResult<()> {
        let mut header: Vec<ChoiceOption> = Vec::new();

        for row in table.select(&ROW) {
            let cells: Vec<ElementRef<'_>> = child_elements(row)
                .filter(|c| matches!(tag(*c), "td" | "th"))
                .collect();
            let is_header = cells.iter().all(|c| tag(*c) == "th");
            if is_header {
                if header.is_empty() {
                    header = cells
                        .iter()
                        .skip(1)
                        .map(|c| inline_text(*c))
                        .filter(|t| !t.is_empty())
                        .map(|t| ChoiceOption::new(t.clone(), t))
                        .collect();
                }
                continue;
            }
            let Some(first) = cells.first().copied() else {
                continue;
            };

            let numbers = first
                .select(&STRONG)
                .next()
                .and_then(|s| parse_numbers(&inline_text(s)))
                .ok_or_else(|| self.missing_number("匹配表格行"))?;
            let prompt = strip_leading_number(&inline_text(first));

            let options = if header.is_empty() {
                row.select(&INPUT)
                    .filter_map(|i| attr(i, "value"))
                    .map(|v| ChoiceOption::new(v, v))
                    .collect()
            } else {
                header.clone()
            };

            self.nodes.push(QuestionNode {
                position: self.next_position(),
                numbers,
                control: Control::Pairing,
                block: BlockShape::Grid,
                prompt,
                options,
                pool: None,
                target_label: None,
                can_reuse: self.reuse || reuse_flag(table),
            });
        }
        Ok(())
    }

    fn push_match_item(&mut self, item: ElementRef<'a>) -> PipelineResult<()> {
        let numbers = item
            .select(&STRONG)
            .next()
            .and_then(|s| parse_numbers(&inline_text(s)))
            .ok_or_else(|| self.missing_number("匹配条目"))?;

        let source = item.select(&PARA).next().unwrap_or(item);
        let text = inline_text_with(source, &mut |child| {
            if is_drop_zone(child) {
                Render::Skip
            } else {
                Render::Descend
            }
        });

        self.nodes.push(QuestionNode {
            position: self.next_position(),
            numbers,
            control: Control::Pairing,
            block: BlockShape::Item,
            prompt: strip_leading_number(&text),
            options: self.pool_options(),
            pool: self.pool_kind(),
            target_label: attr(item, "data-paragraph").map(str::to_string),
            can_reuse: self.reuse || reuse_flag(item),
        });
        Ok(())
    }

    fn push_choice_item(&mut self, item: ElementRef<'a>) -> PipelineResult<()> {
        let numbers = item
            .select(&STRONG)
            .next()
            .and_then(|s| parse_numbers(&inline_text(s)))
            .ok_or_else(|| self.missing_number("选择题条目"))?;

        let control = if item
            .select(&INPUT)
            .any(|i| input_type(i) == "checkbox")
        {
            Control::ChooseMany
        } else {
            Control::ChooseOne
        };

        let mut options = choice_options(item);
        if options.is_empty() {
            options = judgment_fallback(&self.instruction);
        }

        self.nodes.push(QuestionNode {
            position: self.next_position(),
            numbers,
            control,
            block: BlockShape::Item,
            prompt: choice_prompt(item),
            options,
            pool: None,
            target_label: None,
            can_reuse: false,
        });
        Ok(())
    }

    fn push_blank(&mut self, input: ElementRef<'a>) -> PipelineResult<()> {
        let group = self.group;
        let number = input_number(input, group).ok_or_else(|| self.missing_number("填空"))?;
        let (block, prompt) = blank_context(input, group);

        self.nodes.push(QuestionNode {
            position: self.next_position(),
            numbers: vec![number],
            control: Control::FreeText,
            block,
            prompt,
            options: self.pool_options(),
            pool: self.pool_kind(),
            target_label: None,
            can_reuse: self.reuse,
        });
        Ok(())
    }

    fn push_heading_targets(
        &mut self,
        range: Option<(u32, u32)>,
        heading_targets: &BTreeMap<u32, String>,
    ) {
        let in_range = |n: u32| range.map_or(true, |(start, end)| (start..=end).contains(&n));
        for (number, label) in heading_targets {
            if !in_range(*number) {
                continue;
            }
            self.nodes.push(QuestionNode {
                position: self.next_position(),
                numbers: vec![*number],
                control: Control::Pairing,
                block: BlockShape::HeadingTarget,
                prompt: label.clone(),
                options: self.pool_options(),
                pool: Some(PoolKind::Headings),
                target_label: Some(label.clone()),
                can_reuse: self.reuse,
            });
        }
    }
}

/// 组头 "Questions a–b"
fn group_range(group: ElementRef<'_>) -> Option<(u32, u32)> {
    let header = group.select(&HEADER).next()?;
    let text = inline_text(header);
    let caps = RANGE.captures(&text)?;
    let start: u32 = caps.get(1)?.as_str().parse().ok()?;
    let end = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(start);
    Some((start, end))
}

/// 说明文字：题目条目之前的所有直接子元素文本，组头除外，去重后按行拼接
fn gather_instruction(group: ElementRef<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    for child in child_elements(group) {
        if is_structural(child) {
            break;
        }
        if tag(child) == "h4" && RANGE.is_match(&inline_text(child)) {
            continue;
        }
        for line in block_text(child).lines() {
            if !lines.iter().any(|existing| existing == line) {
                lines.push(line.to_string());
            }
        }
    }
    lines.join("\n")
}

fn is_structural(el: ElementRef<'_>) -> bool {
    STRUCTURAL_CLASSES.iter().any(|class| has_class(el, class))
        || matches!(tag(el), "table" | "form")
        || el.select(&INPUT).next().is_some()
        || el.select(&DRAG_ITEM).next().is_some()
}

fn read_pool(pool: ElementRef<'_>) -> (PoolKind, Vec<ChoiceOption>) {
    let mut kind = if has_class(pool, "headings-pool") {
        PoolKind::Headings
    } else {
        PoolKind::Options
    };

    let mut options = Vec::new();
    for item in pool.select(&DRAG_ITEM) {
        let heading = attr(item, "data-heading");
        if heading.is_some() {
            kind = PoolKind::Headings;
        }
        let text = inline_text(item);
        let label = attr(item, "data-option").or(heading).map(str::to_string);
        let option = match label {
            Some(label) => {
                let body = strip_option_label(&text, &label);
                ChoiceOption::new(label, if body.is_empty() { text } else { body })
            }
            None => match LETTERED_OPTION.captures(&text) {
                Some(caps) => ChoiceOption::new(&caps[1], caps[2].trim()),
                None => ChoiceOption::new(text.clone(), text),
            },
        };
        options.push(option);
    }
    (kind, options)
}

/// `data-reuse` 属性存在（且不是 false/0/no）即可重复使用
fn reuse_flag(el: ElementRef<'_>) -> bool {
    match el.value().attr("data-reuse") {
        Some(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "false" | "0" | "no"
        ),
        None => false,
    }
}

/// "NB You may use any letter more than once." 之类的说明
fn instruction_allows_reuse(instruction: &str) -> bool {
    let lower = instruction.to_lowercase();
    REUSE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

fn is_choice_item(el: ElementRef<'_>) -> bool {
    if CHOICE_ITEM_CLASSES.iter().any(|class| has_class(el, class)) {
        return true;
    }
    // 没有 class 的条目：包含题号和单选/多选控件，且不再嵌套其他条目
    tag(el) == "div"
        && el.select(&STRONG).next().is_some()
        && has_choice_controls(el)
        && !child_elements(el).any(|c| tag(c) == "div" && has_choice_controls(c))
}

fn has_choice_controls(el: ElementRef<'_>) -> bool {
    el.select(&INPUT)
        .any(|i| matches!(input_type(i), "radio" | "checkbox"))
}

fn input_type(input: ElementRef<'_>) -> &str {
    attr(input, "type").unwrap_or("text")
}

fn is_text_input(el: ElementRef<'_>) -> bool {
    match tag(el) {
        "textarea" => true,
        "input" => input_type(el).eq_ignore_ascii_case("text"),
        _ => false,
    }
}

fn is_drop_zone(el: ElementRef<'_>) -> bool {
    ["drop-zone", "dropzone", "drop-target", "paragraph-dropzone"]
        .iter()
        .any(|class| has_class(el, class))
}

/// "14" / "14–15" / "14 and 15" → 题号列表
///
/// 跨度超过一整篇阅读的题量视为无法识别
pub fn parse_numbers(text: &str) -> Option<Vec<u32>> {
    let caps = NUMBER_SPAN.captures(text)?;
    let start: u32 = caps.get(1)?.as_str().parse().ok()?;
    match caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
        Some(end) if end > start && end - start < MAX_NUMBER_SPAN => Some((start..=end).collect()),
        Some(end) if end > start => None,
        _ => Some(vec![start]),
    }
}

fn strip_leading_number(text: &str) -> String {
    match NUMBER_SPAN.find(text) {
        Some(m) => text[m.end()..]
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ')'))
            .to_string(),
        None => text.trim().to_string(),
    }
}

fn strip_option_label(text: &str, label: &str) -> String {
    match text.strip_prefix(label) {
        Some(rest) if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || ".)".contains(c)) => rest
            .trim_start_matches(|c: char| c.is_whitespace() || ".)".contains(c))
            .to_string(),
        _ => text.to_string(),
    }
}

fn choice_options(item: ElementRef<'_>) -> Vec<ChoiceOption> {
    let mut options = Vec::new();
    for label_el in item.select(&LABEL) {
        let text = inline_text(label_el);
        if text.is_empty() {
            continue;
        }
        let input = label_el.select(&INPUT).next().or_else(|| {
            let target = attr(label_el, "for")?;
            item.select(&INPUT).find(|i| attr(*i, "id") == Some(target))
        });

        let option = match input.and_then(|i| attr(i, "value")) {
            Some(value) => {
                let body = strip_option_label(&text, value);
                ChoiceOption::new(value, if body.is_empty() { text } else { body })
            }
            None => match LETTERED_OPTION.captures(&text) {
                Some(caps) => ChoiceOption::new(&caps[1], caps[2].trim()),
                None => ChoiceOption::new(text.clone(), text),
            },
        };
        options.push(option);
    }
    options
}

/// 判断题条目没有控件时，按说明文字补出三个固定选项
fn judgment_fallback(instruction: &str) -> Vec<ChoiceOption> {
    let upper = instruction.to_uppercase();
    let labels: &[&str] = if ["TRUE", "FALSE", "NOT GIVEN"].iter().all(|t| upper.contains(t)) {
        &["TRUE", "FALSE", "NOT GIVEN"]
    } else if ["YES", "NO", "NOT GIVEN"].iter().all(|t| upper.contains(t)) {
        &["YES", "NO", "NOT GIVEN"]
    } else {
        &[]
    };
    labels.iter().map(|l| ChoiceOption::new(*l, *l)).collect()
}

fn choice_prompt(item: ElementRef<'_>) -> String {
    let prompt_el = item
        .select(&PARA)
        .find(|p| p.select(&INPUT).next().is_none() && p.select(&LABEL).next().is_none());
    let text = match prompt_el {
        Some(p) => inline_text(p),
        None => inline_text_with(item, &mut |child| match tag(child) {
            "label" | "input" | "ul" | "ol" => Render::Skip,
            _ => Render::Descend,
        }),
    };
    strip_leading_number(&text)
}

/// 填空输入框的题号：属性 → 紧邻的前置题号标签 → 所在条目的题号
fn input_number(input: ElementRef<'_>, group: ElementRef<'_>) -> Option<u32> {
    for name in ["data-question", "data-q", "data-number", "name", "id"] {
        if let Some(caps) = attr(input, name).and_then(|v| INPUT_NAME.captures(v)) {
            if let Some(number) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
                return Some(number);
            }
        }
    }

    if let Some(prev) = input.prev_siblings().filter_map(ElementRef::wrap).next() {
        if is_number_tag(prev) {
            return inline_text(prev).parse().ok();
        }
    }

    closest(input, group, |a| {
        CHOICE_ITEM_CLASSES.iter().any(|class| has_class(a, class))
    })
    .and_then(|item| item.select(&STRONG).next())
    .and_then(|strong| parse_numbers(&inline_text(strong)))
    .and_then(|numbers| numbers.first().copied())
}

fn is_number_tag(el: ElementRef<'_>) -> bool {
    matches!(tag(el), "strong" | "b" | "span")
        && {
            let text = inline_text(el);
            !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
        }
}

/// 紧跟在输入框前面的题号标签（中间只允许空白）
fn is_blank_number_tag(el: ElementRef<'_>) -> bool {
    if !is_number_tag(el) {
        return false;
    }
    for sibling in el.next_siblings() {
        match sibling.value() {
            Node::Text(text) if text.trim().is_empty() => continue,
            Node::Element(_) => {
                return ElementRef::wrap(sibling).is_some_and(is_text_input);
            }
            _ => return false,
        }
    }
    false
}

/// 渲染含空的块：当前空为 `_____`，其他空为 `(题号)`
fn render_blanks(block: ElementRef<'_>, current: ElementRef<'_>, group: ElementRef<'_>) -> String {
    inline_text_with(block, &mut |child| {
        if is_text_input(child) {
            if child.id() == current.id() {
                Render::Replace(BLANK.to_string())
            } else {
                match input_number(child, group) {
                    Some(number) => Render::Replace(format!("({})", number)),
                    None => Render::Replace(BLANK.to_string()),
                }
            }
        } else if is_blank_number_tag(child)
            || (matches!(tag(child), "strong" | "b") && is_number_tag(child))
            || has_class(child, "explanation")
        {
            Render::Skip
        } else {
            Render::Descend
        }
    })
}

/// 确定空所在块的形状并渲染题干
fn blank_context(input: ElementRef<'_>, group: ElementRef<'_>) -> (BlockShape, String) {
    if let Some(row) = closest(input, group, |a| tag(a) == "tr") {
        let cells: Vec<String> = child_elements(row)
            .filter(|c| matches!(tag(*c), "td" | "th"))
            .map(|c| render_blanks(c, input, group))
            .filter(|t| !t.is_empty())
            .collect();
        return (BlockShape::Table, cells.join(" | "));
    }

    if let Some(li) = closest(input, group, |a| tag(a) == "li") {
        return (BlockShape::List, render_blanks(li, input, group));
    }

    if let Some(p) = closest(input, group, |a| tag(a) == "p") {
        let text = render_blanks(p, input, group);
        let in_notes = closest(p, group, |a| has_class(a, "notes-completion")).is_some();
        let in_summary = closest(p, group, |a| has_class(a, "summary-completion")).is_some();
        let shape = if in_notes {
            BlockShape::List
        } else if in_summary || split_sentences(&text).len() > 1 {
            BlockShape::Summary
        } else {
            BlockShape::Sentence
        };
        return (shape, text);
    }

    // 输入框不在题干段落里：取所在条目的题干
    let item = closest(input, group, |a| tag(a) == "div").unwrap_or(group);
    (BlockShape::Detached, choice_prompt(item))
}

/// 按句末标点切分句子
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
