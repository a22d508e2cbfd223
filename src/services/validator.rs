//! 文档校验服务 - 业务能力层
//!
//! 三层规则：
//! - 结构（致命）：必需字段、段落标签、题目数量与元数据一致
//! - 一致性（致命）：题型列表与题目一致、题号连续
//! - 内容（警告）：文本非空、题型专属字段、答案与选项吻合
//!
//! 校验对象是组装好的 `ExamDocument`，因此同样适用于已落盘的 JSON 重新解析后的文档。

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Finding, FindingCategory};
use crate::models::{AnswerValue, ExamDocument, Question, QuestionBody, QuestionType};
use crate::services::document_assembler::dedupe_types;
use crate::services::group_walker::BLANK;
use crate::services::passage_extractor::is_paragraph_label;

/// 文档编号允许的最大序号
pub const MAX_DOCUMENT_NUMBER: u32 = 150;

static DOCUMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^e(\d{3})$").unwrap_or_else(|e| panic!("内置正则非法: {e}")));
static TITLE_RESIDUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"【|】|\[\s*P[123]\s*\]|</?[A-Za-z][^>]*>").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});

/// 校验整篇文档，返回全部发现（致命与警告混合，按规则顺序）
pub fn validate(doc: &ExamDocument) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_structure(doc, &mut findings);
    check_consistency(doc, &mut findings);
    check_content(doc, &mut findings);
    findings
}

/// 是否存在致命问题
pub fn has_fatal(findings: &[Finding]) -> bool {
    findings.iter().any(Finding::is_fatal)
}

fn structural(findings: &mut Vec<Finding>, question: Option<u32>, message: impl Into<String>) {
    findings.push(Finding::fatal(FindingCategory::Structural, question, message));
}

fn content(findings: &mut Vec<Finding>, question: Option<u32>, message: impl Into<String>) {
    findings.push(Finding::warning(FindingCategory::Content, question, message));
}

fn check_structure(doc: &ExamDocument, findings: &mut Vec<Finding>) {
    let id_number = DOCUMENT_ID
        .captures(&doc.id)
        .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok());
    match id_number {
        Some(n) if (1..=MAX_DOCUMENT_NUMBER).contains(&n) => {}
        _ => structural(
            findings,
            None,
            format!("文档编号 {:?} 不符合 e001-e150", doc.id),
        ),
    }

    if doc.passage.paragraphs.is_empty() {
        structural(findings, None, "文章没有段落");
    }
    for (idx, paragraph) in doc.passage.paragraphs.iter().enumerate() {
        if let Some(label) = &paragraph.label {
            if label.is_empty() {
                structural(findings, None, format!("第 {} 段的标签是空字符串", idx + 1));
            } else if !is_paragraph_label(label) {
                structural(
                    findings,
                    None,
                    format!("第 {} 段的标签 {:?} 不是大写字母或罗马数字", idx + 1, label),
                );
            }
        }
    }

    if doc.questions.is_empty() {
        structural(findings, None, "文档没有题目");
    }
    if doc.metadata.total_questions != doc.questions.len() {
        structural(
            findings,
            None,
            format!(
                "totalQuestions = {}，实际题目数 {}",
                doc.metadata.total_questions,
                doc.questions.len()
            ),
        );
    }

    for question in &doc.questions {
        if question.number == 0 {
            structural(findings, Some(0), "题号必须是正整数");
        }
        if let QuestionBody::MultiChoice {
            checkbox_group_name,
            occupies_questions,
            ..
        } = &question.body
        {
            if !question.answer.is_list() {
                structural(findings, Some(question.number), "多选题答案必须是列表");
            }
            if *occupies_questions == 0 {
                structural(findings, Some(question.number), "occupiesQuestions 必须大于 0");
            }
            let expected = format!("group{}", question.number);
            if *checkbox_group_name != expected {
                structural(
                    findings,
                    Some(question.number),
                    format!(
                        "checkboxGroupName 应为 {:?}，实际 {:?}",
                        expected, checkbox_group_name
                    ),
                );
            }
        }
    }
}

fn check_consistency(doc: &ExamDocument, findings: &mut Vec<Finding>) {
    let expected_types = dedupe_types(&doc.questions);
    if doc.metadata.question_types != expected_types {
        findings.push(Finding::fatal(
            FindingCategory::Consistency,
            None,
            "questionTypes 与题目中出现的题型（按首次出现去重）不一致",
        ));
    }

    let mut expected: Option<u32> = None;
    for question in &doc.questions {
        if let Some(next) = expected {
            if question.number != next {
                findings.push(Finding::fatal(
                    FindingCategory::Consistency,
                    Some(question.number),
                    format!("题号不连续: 期望 {}，实际 {}", next, question.number),
                ));
            }
        }
        expected = question.number.checked_add(question.body.occupies().max(1));
    }
}

fn check_content(doc: &ExamDocument, findings: &mut Vec<Finding>) {
    let title = &doc.passage.title;
    if title.trim().is_empty() {
        content(findings, None, "文章标题为空");
    } else if TITLE_RESIDUE.is_match(title) {
        content(findings, None, format!("文章标题含难度标记或残留标签: {:?}", title));
    }
    for (idx, paragraph) in doc.passage.paragraphs.iter().enumerate() {
        if paragraph.content.trim().is_empty() {
            content(findings, None, format!("第 {} 段内容为空", idx + 1));
        }
    }

    for question in &doc.questions {
        check_question(question, findings);
    }
}

fn check_question(question: &Question, findings: &mut Vec<Finding>) {
    let number = Some(question.number);
    let kind = question.question_type();

    if question.instruction.trim().is_empty() {
        content(findings, number, "说明文字为空");
    }
    if question.explanation.as_deref().is_some_and(|e| e.trim().is_empty()) {
        content(findings, number, "解析为空字符串");
    }

    match &question.body {
        QuestionBody::Judgment { content: body, .. } => {
            if body.statement.trim().is_empty() {
                content(findings, number, "判断题陈述为空");
            }
        }
        QuestionBody::SingleChoice(body) | QuestionBody::MultiChoice { content: body, .. } => {
            if body.question_text.trim().is_empty() {
                content(findings, number, "题干为空");
            }
        }
        QuestionBody::Completion { content: body, .. } => {
            if body.word_limit == 0 {
                content(findings, number, "wordLimit 必须为正数");
            }
            if kind != QuestionType::ShortAnswer && !body.sentence.contains(BLANK) {
                content(findings, number, "填空题题干中没有空位标记");
            }
            if body.options.is_some() != body.can_reuse.is_some() {
                content(findings, number, "选词填空题的 options 与 canReuse 必须同时出现");
            }
        }
        QuestionBody::Matching { content: body, .. } => {
            if body.prompt.trim().is_empty() {
                content(findings, number, format!("匹配题 {} 为空", body.field.key()));
            }
        }
    }

    check_answer(question, kind, findings);
}

/// 答案与题型、选项是否吻合
fn check_answer(question: &Question, kind: QuestionType, findings: &mut Vec<Finding>) {
    let number = Some(question.number);
    let values = question.answer.values();

    if values.iter().any(|v| v.trim().is_empty()) {
        content(findings, number, "答案含空字符串");
    }

    if let Some(vocabulary) = kind.judgment_vocabulary() {
        for value in &values {
            if !vocabulary.contains(value) {
                content(
                    findings,
                    number,
                    format!("判断题答案 {:?} 不在 {:?} 中", value, vocabulary),
                );
            }
        }
        return;
    }

    if let QuestionBody::MultiChoice {
        occupies_questions, ..
    } = &question.body
    {
        if let AnswerValue::Multiple(list) = &question.answer {
            if list.len() != *occupies_questions as usize {
                content(
                    findings,
                    number,
                    format!(
                        "多选题答案 {} 个，occupiesQuestions 为 {}",
                        list.len(),
                        occupies_questions
                    ),
                );
            }
        }
    }

    let options = question.body.options();
    if options.is_empty() {
        return;
    }
    for value in &values {
        let known = options
            .iter()
            .any(|option| option.label.eq_ignore_ascii_case(value));
        if !known {
            content(findings, number, format!("答案 {:?} 不是任何选项的标签", value));
        }
    }
}
