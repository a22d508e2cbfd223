//! 答案表提取服务 - 业务能力层
//!
//! 从内联脚本中找出答案表（`q<题号>` → 字符串或字符串列表）以及可选的解析表，
//! 另外收集页面中 `div.explanation[data-question]` 形式的解析。

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::{debug, warn};

use crate::error::{Finding, FindingCategory, PipelineError, PipelineResult};
use crate::infrastructure::answer_script::{scan_objects, NamedObject, ScriptValue};
use crate::infrastructure::dom::{attr, block_text, sel, ExamPage};

/// 答案表变量名（按优先级）
const ANSWER_TABLE_NAMES: [&str; 4] = ["correctAnswers", "answers", "answerKey", "solutions"];

/// 解析表变量名中出现这些片段即视为解析表
const EXPLANATION_NAME_HINTS: [&str; 5] = ["explanation", "analysis", "hint", "tips", "解析"];

/// 解析对象内部的优先字段
const EXPLANATION_FIELDS: [&str; 5] = ["explanation", "analysis", "hint", "tips", "reason"];

static ANSWER_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^q(\d+)(?:\s*[_\-–]\s*(\d+))?$").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});

static MARKUP_EXPLANATION: LazyLock<Selector> =
    LazyLock::new(|| sel(".explanation[data-question]"));

/// 答案表中的原始值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAnswer {
    Scalar(String),
    List(Vec<String>),
}

/// 一篇文档的答案表与解析表
#[derive(Debug, Default)]
pub struct AnswerTable {
    /// 答案表来源变量名
    pub source: String,
    answers: BTreeMap<u32, RawAnswer>,
    explanations: BTreeMap<u32, String>,
}

impl AnswerTable {
    /// 按题号（多选题为首个题号）取原始答案
    pub fn answer(&self, number: u32) -> Option<&RawAnswer> {
        self.answers.get(&number)
    }

    pub fn explanation(&self, number: u32) -> Option<&str> {
        self.explanations.get(&number).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// 答案表中有、但没有被任何题目消费的题号
    pub fn unused_numbers<'a>(&'a self, used: &'a [u32]) -> impl Iterator<Item = u32> + 'a {
        self.answers.keys().copied().filter(|n| !used.contains(n))
    }
}

/// 提取答案表
///
/// 没有答案表是致命错误；重复键取第一个并记录警告
pub fn extract(page: &ExamPage, findings: &mut Vec<Finding>) -> PipelineResult<AnswerTable> {
    let mut objects = Vec::new();
    let mut broken = Vec::new();
    for script in page.scripts() {
        let scan = scan_objects(&script);
        objects.extend(scan.objects);
        broken.extend(scan.failures);
    }

    let table_object = ANSWER_TABLE_NAMES
        .iter()
        .find_map(|name| objects.iter().find(|object| object.name == *name));

    let Some(table_object) = table_object else {
        let detail = broken
            .iter()
            .find(|(name, _)| ANSWER_TABLE_NAMES.contains(&name.as_str()))
            .map(|(name, err)| format!("{} 无法解析: {}", name, err))
            .unwrap_or_else(|| "页面脚本中没有答案表".to_string());
        return Err(PipelineError::extraction(None, "answerTable", detail));
    };

    let mut table = AnswerTable {
        source: table_object.name.clone(),
        ..AnswerTable::default()
    };
    collect_answers(table_object, &mut table, findings);

    for object in objects.iter().filter(|o| is_explanation_object(&o.name)) {
        collect_explanations(object, &mut table.explanations, findings);
    }
    collect_markup_explanations(page, &mut table.explanations);

    debug!(
        "答案表 {}: {} 条答案, {} 条解析",
        table.source,
        table.answers.len(),
        table.explanations.len()
    );
    Ok(table)
}

fn collect_answers(object: &NamedObject, table: &mut AnswerTable, findings: &mut Vec<Finding>) {
    for (key, value) in &object.entries {
        let Some(number) = parse_answer_key(key) else {
            warn!("答案表中忽略无法识别的键: {}", key);
            findings.push(Finding::warning(
                FindingCategory::Content,
                None,
                format!("答案表键 {:?} 不是 q<题号> 形式，已忽略", key),
            ));
            continue;
        };

        let raw = match value {
            ScriptValue::Text(text) => RawAnswer::Scalar(text.clone()),
            ScriptValue::List(_) => RawAnswer::List(
                value.text_leaves().into_iter().map(str::to_string).collect(),
            ),
            ScriptValue::Null => continue,
            ScriptValue::Object(_) => {
                findings.push(Finding::warning(
                    FindingCategory::Content,
                    Some(number),
                    "答案值是对象而不是字符串或列表，已忽略",
                ));
                continue;
            }
        };

        if table.answers.contains_key(&number) {
            findings.push(Finding::warning(
                FindingCategory::Content,
                Some(number),
                format!("答案表中题号 {} 重复（键 {}），保留第一个", number, key),
            ));
            continue;
        }
        table.answers.insert(number, raw);
    }
}

/// `q14` / `q14_15` / `Q14-15` → 14
pub fn parse_answer_key(key: &str) -> Option<u32> {
    let caps = ANSWER_KEY.captures(key.trim())?;
    caps.get(1)?.as_str().parse().ok()
}

fn is_explanation_object(name: &str) -> bool {
    let lower = name.to_lowercase();
    EXPLANATION_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

fn collect_explanations(
    object: &NamedObject,
    explanations: &mut BTreeMap<u32, String>,
    findings: &mut Vec<Finding>,
) {
    for (key, value) in &object.entries {
        let Some(number) = parse_answer_key(key) else {
            continue;
        };
        let text = flatten_explanation(value);
        if text.is_empty() {
            continue;
        }
        if explanations.contains_key(&number) {
            findings.push(Finding::warning(
                FindingCategory::Content,
                Some(number),
                format!("解析重复（来自 {}），保留第一个", object.name),
            ));
            continue;
        }
        explanations.insert(number, text);
    }
}

fn flatten_explanation(value: &ScriptValue) -> String {
    let leaves = match value {
        ScriptValue::Object(entries) => EXPLANATION_FIELDS
            .iter()
            .find_map(|field| entries.iter().find(|(k, _)| k == field).map(|(_, v)| v))
            .map(ScriptValue::text_leaves)
            .unwrap_or_else(|| value.text_leaves()),
        _ => value.text_leaves(),
    };
    leaves
        .iter()
        .map(|leaf| leaf.trim())
        .filter(|leaf| !leaf.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_markup_explanations(page: &ExamPage, explanations: &mut BTreeMap<u32, String>) {
    for node in page.root().select(&MARKUP_EXPLANATION) {
        let Some(number) = attr(node, "data-question").and_then(|raw| {
            parse_answer_key(raw).or_else(|| raw.parse().ok())
        }) else {
            continue;
        };
        let text = block_text(node);
        if !text.is_empty() {
            explanations.entry(number).or_insert(text);
        }
    }
}
