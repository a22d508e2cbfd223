//! 答案/解析绑定服务 - 业务能力层
//!
//! 把答案表中的原始值按题号挂到题目上，并做格式规整。
//! 任何一道题找不到答案都是致命错误，整篇文档被拒绝。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Finding, FindingCategory, PipelineError, PipelineResult};
use crate::models::{AnswerValue, InteractionClass, Question, QuestionBody, QuestionType};
use crate::services::answer_table::{AnswerTable, RawAnswer};
use crate::services::field_extractor::DraftQuestion;

/// 多选题答案个数无法确定时的默认值
pub const DEFAULT_OCCUPIES: u32 = 2;

/// 原样保留的判断题答案
const VERBATIM_WORDS: [&str; 5] = ["TRUE", "FALSE", "NOT GIVEN", "YES", "NO"];

static LETTER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]$").unwrap_or_else(|e| panic!("内置正则非法: {e}")));
/// I 到 XXXIX，只认书写规范的大写罗马数字
static UPPER_ROMAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^X{0,3}(?:IX|IV|V?I{0,3})$").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static LOWER_ROMAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ivxlc]+$").unwrap_or_else(|e| panic!("内置正则非法: {e}")));

/// 已绑定答案、尚未定号的题目
#[derive(Debug, Clone)]
pub struct BoundQuestion {
    pub question: Question,
    /// 所在题组声明的题号区间
    pub group_range: Option<(u32, u32)>,
}

/// 绑定答案与解析
pub fn bind(
    drafts: Vec<DraftQuestion>,
    table: &AnswerTable,
    findings: &mut Vec<Finding>,
) -> PipelineResult<Vec<BoundQuestion>> {
    let mut bound = Vec::with_capacity(drafts.len());
    let mut used: Vec<u32> = Vec::new();

    for draft in drafts {
        let number = draft.first_number();
        let kind = draft.body.question_type();
        let raw = table
            .answer(number)
            .ok_or_else(|| PipelineError::binding(number, "答案表中没有该题的答案"))?;

        let mut body = draft.body;
        let answer = match &mut body {
            QuestionBody::MultiChoice {
                occupies_questions, ..
            } => {
                let values = match raw {
                    RawAnswer::List(values) if !values.is_empty() => values,
                    RawAnswer::List(_) => {
                        return Err(PipelineError::binding(number, "多选题答案列表为空"))
                    }
                    RawAnswer::Scalar(value) => {
                        return Err(PipelineError::binding(
                            number,
                            format!("多选题答案必须是列表，实际为单值 {:?}", value),
                        ))
                    }
                };
                if *occupies_questions == 0 {
                    *occupies_questions = resolve_occupies(number, values.len(), findings);
                }
                AnswerValue::Multiple(values.iter().map(|v| normalize_answer(v, kind)).collect())
            }
            _ => match raw {
                RawAnswer::Scalar(value) => AnswerValue::Single(normalize_answer(value, kind)),
                RawAnswer::List(values) => {
                    AnswerValue::Multiple(values.iter().map(|v| normalize_answer(v, kind)).collect())
                }
            },
        };

        let end = number.checked_add(body.occupies().max(1)).ok_or_else(|| {
            PipelineError::extraction(Some(number), "questionNumber", "题号超出可表示的范围")
        })?;
        used.extend(number..end);
        let explanation = table.explanation(number).map(normalize_quotes);

        debug!("题目 {} ({}) 绑定答案 {}", number, kind.code(), answer);
        bound.push(BoundQuestion {
            question: Question {
                number,
                instruction: draft.instruction,
                body,
                answer,
                explanation,
            },
            group_range: draft.group_range,
        });
    }

    for unused in table.unused_numbers(&used) {
        findings.push(Finding::warning(
            FindingCategory::Content,
            Some(unused),
            "答案表中的条目没有对应的题目",
        ));
    }

    Ok(bound)
}

/// 说明文字没给出个数时按答案列表长度确定，不足 2 时退回默认值并记录警告
fn resolve_occupies(number: u32, answer_len: usize, findings: &mut Vec<Finding>) -> u32 {
    match u32::try_from(answer_len) {
        Ok(len) if len >= 2 => len,
        _ => {
            findings.push(Finding::warning(
                FindingCategory::Content,
                Some(number),
                format!(
                    "无法确定多选题占用的题号数（答案 {} 个），使用默认值 {}",
                    answer_len, DEFAULT_OCCUPIES
                ),
            ));
            DEFAULT_OCCUPIES
        }
    }
}

/// 答案规整：去首尾空白；判断词、字母标签、大写罗马数字原样保留；
/// 标题匹配题的小写罗马数字原样保留；其余转小写
pub fn normalize_answer(raw: &str, kind: QuestionType) -> String {
    let value = raw.trim();

    if let Some(vocabulary) = kind.judgment_vocabulary() {
        let upper = value.to_uppercase();
        if vocabulary.contains(&upper.as_str()) {
            return upper;
        }
    }
    if VERBATIM_WORDS.contains(&value) || LETTER_LABEL.is_match(value) {
        return value.to_string();
    }
    // 填空题的自由作答不按罗马数字标签处理
    if kind.interaction_class() != InteractionClass::Completion
        && !value.is_empty()
        && UPPER_ROMAN.is_match(value)
    {
        return value.to_string();
    }
    if kind == QuestionType::HeadingMatching && LOWER_ROMAN.is_match(value) {
        return value.to_string();
    }
    value.to_lowercase()
}

/// 解析中的引号统一为单引号
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '"' | '“' | '”' | '‘' | '’' => '\'',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::dom::ExamPage;
    use crate::models::{ChoiceContent, ChoiceOption, JudgmentContent, JudgmentKind};
    use crate::services::answer_table;
    use crate::services::group_walker::NodePosition;

    fn table(script: &str) -> AnswerTable {
        let page = ExamPage::parse(&format!("<html><body><script>{}</script></body></html>", script));
        answer_table::extract(&page, &mut Vec::new()).unwrap()
    }

    fn judgment(number: u32) -> DraftQuestion {
        DraftQuestion {
            position: NodePosition { group: 1, item: 1 },
            numbers: vec![number],
            instruction: "Write TRUE, FALSE or NOT GIVEN.".to_string(),
            body: QuestionBody::Judgment {
                kind: JudgmentKind::TrueFalseNotGiven,
                content: JudgmentContent {
                    statement: "X".to_string(),
                },
            },
            group_range: None,
        }
    }

    fn multi(number: u32, occupies: u32) -> DraftQuestion {
        DraftQuestion {
            position: NodePosition { group: 2, item: 1 },
            numbers: vec![number],
            instruction: "Choose the correct letters.".to_string(),
            body: QuestionBody::MultiChoice {
                content: ChoiceContent {
                    question_text: "Which are true?".to_string(),
                    options: vec![ChoiceOption::new("A", "a"), ChoiceOption::new("B", "b")],
                },
                checkbox_group_name: format!("group{}", number),
                occupies_questions: occupies,
            },
            group_range: None,
        }
    }

    #[test]
    fn test_normalize_answer_rules() {
        assert_eq!(normalize_answer(" Disease ", QuestionType::SentenceCompletion), "disease");
        assert_eq!(normalize_answer("TRUE", QuestionType::TrueFalseNg), "TRUE");
        assert_eq!(normalize_answer("not given", QuestionType::YesNoNg), "NOT GIVEN");
        assert_eq!(normalize_answer("B", QuestionType::ParagraphMatching), "B");
        assert_eq!(normalize_answer("IV", QuestionType::Classification), "IV");
        assert_eq!(normalize_answer("iv", QuestionType::HeadingMatching), "iv");
        assert_eq!(normalize_answer("b", QuestionType::MultipleChoiceMultiple), "b");
    }

    #[test]
    fn test_free_text_acronyms_are_lowercased() {
        assert_eq!(normalize_answer("US", QuestionType::SentenceCompletion), "us");
        assert_eq!(normalize_answer("CIVIL", QuestionType::NotesCompletion), "civil");
        assert_eq!(normalize_answer("VI", QuestionType::ShortAnswer), "vi");
        // 选词填空的字母标签仍原样保留
        assert_eq!(normalize_answer("C", QuestionType::SummaryCompletion), "C");
        assert_eq!(normalize_answer("XIV", QuestionType::ParagraphMatching), "XIV");
        assert_eq!(normalize_answer("CIVIL", QuestionType::Classification), "civil");
    }

    #[test]
    fn test_question_number_overflow_is_rejected() {
        let t = table("const correctAnswers = { q4294967295: 'TRUE' };");
        let err = bind(vec![judgment(u32::MAX)], &t, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Extraction {
                question: Some(u32::MAX),
                ..
            }
        ));
    }

    #[test]
    fn test_bind_judgment_with_explanation() {
        let t = table(
            "const correctAnswers = { q9: 'FALSE' }; const explanations = { q9: 'He said \"no\" twice.' };",
        );
        let mut findings = Vec::new();
        let bound = bind(vec![judgment(9)], &t, &mut findings).unwrap();
        let q = &bound[0].question;
        assert_eq!(q.answer, AnswerValue::Single("FALSE".into()));
        assert_eq!(q.explanation.as_deref(), Some("He said 'no' twice."));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_missing_answer_is_binding_error() {
        let t = table("const correctAnswers = { q1: 'TRUE' };");
        let err = bind(vec![judgment(1), judgment(2)], &t, &mut Vec::new()).unwrap_err();
        assert_eq!(err, PipelineError::binding(2, "答案表中没有该题的答案"));
    }

    #[test]
    fn test_multi_choice_answers_stay_lists() {
        let t = table("const correctAnswers = { q14: ['B', 'D'], q20: ['b'] };");
        let mut findings = Vec::new();
        let bound = bind(vec![multi(14, 0), multi(20, 2)], &t, &mut findings).unwrap();

        assert_eq!(bound[0].question.answer, AnswerValue::Multiple(vec!["B".into(), "D".into()]));
        assert_eq!(bound[0].question.body.occupies(), 2);
        assert_eq!(bound[1].question.answer, AnswerValue::Multiple(vec!["b".into()]));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_multi_choice_scalar_is_binding_error() {
        let t = table("const correctAnswers = { q14: 'B' };");
        let err = bind(vec![multi(14, 2)], &t, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Binding { question: 14, .. }));
    }

    #[test]
    fn test_single_answer_multi_choice_defaults_occupies() {
        let t = table("const correctAnswers = { q14: ['B'] };");
        let mut findings = Vec::new();
        let bound = bind(vec![multi(14, 0)], &t, &mut findings).unwrap();
        assert_eq!(bound[0].question.body.occupies(), DEFAULT_OCCUPIES);
        assert_eq!(findings.len(), 1);
        assert!(!findings[0].is_fatal());
    }

    #[test]
    fn test_unused_answers_warn() {
        let t = table("const correctAnswers = { q1: 'TRUE', q2: 'FALSE' };");
        let mut findings = Vec::new();
        bind(vec![judgment(1)], &t, &mut findings).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].question, Some(2));
    }
}
