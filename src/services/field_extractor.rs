//! 字段提取服务 - 业务能力层
//!
//! 题型确定之后，按交互类别产出该题型固定的 `content` 字段集合。
//! 多选题的 `occupiesQuestions` 在这里只给出说明文字能确定的值，其余交给答案绑定阶段。

use std::sync::LazyLock;

use phf::phf_map;
use regex::Regex;

use crate::error::{Finding, FindingCategory, PipelineError, PipelineResult};
use crate::models::{
    ChoiceContent, CompletionContent, CompletionKind, JudgmentContent, JudgmentKind,
    MatchingContent, MatchingKind, PromptField, QuestionBody, QuestionType,
};
use crate::services::group_walker::{split_sentences, NodePosition, QuestionGroup, QuestionNode, BLANK};

/// 说明文字未给出字数限制时使用的默认值
pub const DEFAULT_WORD_LIMIT: u32 = 3;

static CARDINALS: phf::Map<&'static str, u32> = phf_map! {
    "ONE" => 1,
    "TWO" => 2,
    "THREE" => 3,
    "FOUR" => 4,
    "FIVE" => 5,
    "SIX" => 6,
};

static WORD_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(ONE|TWO|THREE|FOUR|FIVE|SIX|\d+)\s+WORDS?\b")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static CHOOSE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:choose|which|select)\s+(TWO|THREE|FOUR|FIVE|\d+)\b")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});
static PARAGRAPH_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)paragraph\s+([A-Z]+)\b").unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});

/// 字段提取后的题目草稿（尚未绑定答案与最终题号）
#[derive(Debug, Clone)]
pub struct DraftQuestion {
    pub position: NodePosition,
    /// 节点上标注的题号
    pub numbers: Vec<u32>,
    pub instruction: String,
    pub body: QuestionBody,
    /// 所在题组声明的题号区间
    pub group_range: Option<(u32, u32)>,
}

impl DraftQuestion {
    pub fn first_number(&self) -> u32 {
        self.numbers.first().copied().unwrap_or_default()
    }
}

/// "TWO" / "2" → 2
pub fn cardinal_value(word: &str) -> Option<u32> {
    word.trim()
        .parse()
        .ok()
        .or_else(|| CARDINALS.get(word.trim().to_ascii_uppercase().as_str()).copied())
}

/// 说明文字中的字数限制（"NO MORE THAN TWO WORDS" → 2）
pub fn word_limit(instruction: &str) -> Option<u32> {
    let caps = WORD_LIMIT.captures(instruction)?;
    cardinal_value(caps.get(1)?.as_str()).filter(|n| *n > 0)
}

/// 说明文字要求选出的答案个数（"Choose TWO letters" → 2），至少为 2 才算
pub fn choice_count(instruction: &str) -> Option<u32> {
    let caps = CHOOSE_COUNT.captures(instruction)?;
    cardinal_value(caps.get(1)?.as_str()).filter(|n| *n >= 2)
}

/// 按题型提取 `content`
pub fn extract(
    node: &QuestionNode,
    group: &QuestionGroup,
    kind: QuestionType,
    findings: &mut Vec<Finding>,
) -> PipelineResult<DraftQuestion> {
    let number = node.first_number();
    let missing = |field: &str, reason: &str| {
        PipelineError::extraction(number, field, format!("{}: {}", node.position, reason))
    };
    if node.numbers.is_empty() {
        return Err(missing("questionNumber", "节点没有题号"));
    }

    let body = match kind {
        QuestionType::TrueFalseNg | QuestionType::YesNoNg => {
            if node.prompt.is_empty() {
                return Err(missing("statement", "判断题陈述为空"));
            }
            QuestionBody::Judgment {
                kind: if kind == QuestionType::TrueFalseNg {
                    JudgmentKind::TrueFalseNotGiven
                } else {
                    JudgmentKind::YesNoNotGiven
                },
                content: JudgmentContent {
                    statement: node.prompt.clone(),
                },
            }
        }
        QuestionType::MultipleChoiceSingle | QuestionType::MultipleChoiceMultiple => {
            if node.prompt.is_empty() {
                return Err(missing("questionText", "题干为空"));
            }
            if node.options.is_empty() {
                return Err(missing("options", "选择题没有选项"));
            }
            let content = ChoiceContent {
                question_text: node.prompt.clone(),
                options: node.options.clone(),
            };
            if kind == QuestionType::MultipleChoiceSingle {
                QuestionBody::SingleChoice(content)
            } else {
                let first = number.ok_or_else(|| missing("questionNumber", "多选题没有题号"))?;
                // 0 表示尚未确定，由答案绑定阶段按答案列表长度补齐
                let occupies = choice_count(&group.instruction)
                    .or_else(|| (node.numbers.len() > 1).then_some(node.numbers.len() as u32))
                    .unwrap_or(0);
                QuestionBody::MultiChoice {
                    content,
                    checkbox_group_name: format!("group{}", first),
                    occupies_questions: occupies,
                }
            }
        }
        QuestionType::SentenceCompletion
        | QuestionType::SummaryCompletion
        | QuestionType::TableCompletion
        | QuestionType::NotesCompletion
        | QuestionType::ShortAnswer => {
            let completion_kind = match kind {
                QuestionType::SentenceCompletion => CompletionKind::Sentence,
                QuestionType::SummaryCompletion => CompletionKind::Summary,
                QuestionType::TableCompletion => CompletionKind::Table,
                QuestionType::NotesCompletion => CompletionKind::Notes,
                _ => CompletionKind::ShortAnswer,
            };
            let sentence = completion_sentence(node, completion_kind);
            if sentence.is_empty() {
                return Err(missing("sentence", "填空题题干为空"));
            }

            let limit = match word_limit(&group.instruction) {
                Some(limit) => limit,
                None => {
                    findings.push(Finding::warning(
                        FindingCategory::Content,
                        number,
                        format!(
                            "{}: 说明文字中没有字数限制，wordLimit 使用默认值 {}",
                            node.position, DEFAULT_WORD_LIMIT
                        ),
                    ));
                    DEFAULT_WORD_LIMIT
                }
            };

            let word_bank = !node.options.is_empty();
            QuestionBody::Completion {
                kind: completion_kind,
                content: CompletionContent {
                    sentence,
                    word_limit: limit,
                    options: word_bank.then(|| node.options.clone()),
                    can_reuse: word_bank.then_some(node.can_reuse),
                },
            }
        }
        QuestionType::ParagraphMatching
        | QuestionType::HeadingMatching
        | QuestionType::FeatureMatching
        | QuestionType::StatementMatching
        | QuestionType::SentenceEndingMatching
        | QuestionType::Classification => {
            let matching_kind = match kind {
                QuestionType::ParagraphMatching => MatchingKind::Paragraph,
                QuestionType::HeadingMatching => MatchingKind::Heading,
                QuestionType::FeatureMatching => MatchingKind::Feature,
                QuestionType::StatementMatching => MatchingKind::Statement,
                QuestionType::SentenceEndingMatching => MatchingKind::SentenceEnding,
                _ => MatchingKind::Classification,
            };
            let (field, prompt) = matching_prompt(node, matching_kind);
            if prompt.is_empty() {
                return Err(missing(field.key(), "匹配题题干为空"));
            }
            if node.options.is_empty() {
                return Err(missing("options", "匹配题没有选项"));
            }
            QuestionBody::Matching {
                kind: matching_kind,
                content: MatchingContent {
                    field,
                    prompt,
                    options: node.options.clone(),
                    can_reuse: node.can_reuse,
                },
            }
        }
    };

    Ok(DraftQuestion {
        position: node.position,
        numbers: node.numbers.clone(),
        instruction: group.instruction.clone(),
        body,
        group_range: group.range,
    })
}

fn completion_sentence(node: &QuestionNode, kind: CompletionKind) -> String {
    match kind {
        CompletionKind::Summary => split_sentences(&node.prompt)
            .into_iter()
            .find(|sentence| sentence.contains(BLANK))
            .unwrap_or_else(|| node.prompt.clone()),
        _ => node.prompt.clone(),
    }
}

fn matching_prompt(node: &QuestionNode, kind: MatchingKind) -> (PromptField, String) {
    match kind {
        MatchingKind::Heading => {
            let label = node.target_label.clone().unwrap_or_else(|| {
                PARAGRAPH_REF
                    .captures(&node.prompt)
                    .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                    .unwrap_or_else(|| node.prompt.clone())
            });
            (PromptField::ParagraphLabel, label)
        }
        MatchingKind::Feature => (PromptField::Feature, node.prompt.clone()),
        MatchingKind::SentenceEnding => (PromptField::SentenceStart, node.prompt.clone()),
        MatchingKind::Classification if !ends_like_sentence(&node.prompt) => {
            (PromptField::Item, node.prompt.clone())
        }
        MatchingKind::Paragraph | MatchingKind::Statement | MatchingKind::Classification => {
            (PromptField::Statement, node.prompt.clone())
        }
    }
}

/// 以句末标点结尾
pub fn ends_like_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '?', '!'])
}
