//! 试卷文档模型
//!
//! 输出字段顺序：`id, passage, questions, metadata`；题目内部顺序为
//! `questionNumber, type, instruction, content, answer, explanation?,
//! checkboxGroupName?, occupiesQuestions?, canReuse?`

use serde::{Deserialize, Serialize};

use super::answer::AnswerValue;
use super::content::{
    CompletionKind, ContentWire, JudgmentKind, MatchingKind, QuestionBody,
};
use super::question_type::QuestionType;

/// 单篇阅读试卷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExamDocument {
    pub id: String,
    pub passage: Passage,
    pub questions: Vec<Question>,
    pub metadata: Metadata,
}

/// 阅读文章
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Passage {
    pub title: String,
    pub paragraphs: Vec<Paragraph>,
}

/// 段落（`label` 为空时序列化为 null，绝不输出空字符串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Paragraph {
    pub label: Option<String>,
    pub content: String,
}

/// 难度（P1 / P2 / P3）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    P1 = 1,
    P2 = 2,
    P3 = 3,
}

impl Difficulty {
    /// 该难度下题号的建议范围（边界 14、27 两侧重叠）
    pub fn number_range(self) -> (u32, u32) {
        match self {
            Difficulty::P1 => (1, 14),
            Difficulty::P2 => (14, 27),
            Difficulty::P3 => (27, 40),
        }
    }

    /// 从 "P1" / "P2" / "P3" 解析
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "P1" => Some(Difficulty::P1),
            "P2" => Some(Difficulty::P2),
            "P3" => Some(Difficulty::P3),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::P1),
            2 => Ok(Difficulty::P2),
            3 => Ok(Difficulty::P3),
            other => Err(format!("难度必须是 1/2/3，实际为 {}", other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value as u8
    }
}

/// 元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Metadata {
    pub difficulty: Difficulty,
    pub total_questions: usize,
    pub question_types: Vec<QuestionType>,
}

/// 单道题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionWire", into = "QuestionWire")]
pub struct Question {
    pub number: u32,
    pub instruction: String,
    pub body: QuestionBody,
    pub answer: AnswerValue,
    pub explanation: Option<String>,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.body.question_type()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct QuestionWire {
    question_number: u32,
    #[serde(rename = "type")]
    kind: QuestionType,
    instruction: String,
    content: ContentWire,
    answer: AnswerValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checkbox_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    occupies_questions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_reuse: Option<bool>,
}

impl From<Question> for QuestionWire {
    fn from(question: Question) -> Self {
        let kind = question.body.question_type();
        let can_reuse = question.body.can_reuse();
        let (content, checkbox_group_name, occupies_questions) = match question.body {
            QuestionBody::Judgment { content, .. } => (ContentWire::Judgment(content), None, None),
            QuestionBody::SingleChoice(content) => (ContentWire::Choice(content), None, None),
            QuestionBody::MultiChoice {
                content,
                checkbox_group_name,
                occupies_questions,
            } => (
                ContentWire::Choice(content),
                Some(checkbox_group_name),
                Some(occupies_questions),
            ),
            QuestionBody::Completion { content, .. } => {
                (ContentWire::Completion(content), None, None)
            }
            QuestionBody::Matching { content, .. } => (ContentWire::Matching(content), None, None),
        };

        Self {
            question_number: question.number,
            kind,
            instruction: question.instruction,
            content,
            answer: question.answer,
            explanation: question.explanation,
            checkbox_group_name,
            occupies_questions,
            can_reuse,
        }
    }
}

impl TryFrom<QuestionWire> for Question {
    type Error = String;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        let number = wire.question_number;
        let mismatch = || format!("题目 {} 的 content 形状与题型 {} 不符", number, wire.kind);

        let body = match (wire.kind, wire.content) {
            (QuestionType::TrueFalseNg, ContentWire::Judgment(content)) => QuestionBody::Judgment {
                kind: JudgmentKind::TrueFalseNotGiven,
                content,
            },
            (QuestionType::YesNoNg, ContentWire::Judgment(content)) => QuestionBody::Judgment {
                kind: JudgmentKind::YesNoNotGiven,
                content,
            },
            (QuestionType::MultipleChoiceSingle, ContentWire::Choice(content)) => {
                QuestionBody::SingleChoice(content)
            }
            (QuestionType::MultipleChoiceMultiple, ContentWire::Choice(content)) => {
                QuestionBody::MultiChoice {
                    content,
                    checkbox_group_name: wire
                        .checkbox_group_name
                        .clone()
                        .ok_or_else(|| format!("题目 {} 缺少 checkboxGroupName", number))?,
                    occupies_questions: wire
                        .occupies_questions
                        .ok_or_else(|| format!("题目 {} 缺少 occupiesQuestions", number))?,
                }
            }
            (kind, ContentWire::Completion(content)) => QuestionBody::Completion {
                kind: completion_kind(kind).ok_or_else(mismatch)?,
                content,
            },
            (kind, ContentWire::Matching(content)) => {
                let kind = matching_kind(kind).ok_or_else(mismatch)?;
                if !kind.allows(content.field) {
                    return Err(format!(
                        "题目 {} 的主字段 {} 不适用于该匹配题型",
                        number,
                        content.field.key()
                    ));
                }
                QuestionBody::Matching { kind, content }
            }
            _ => return Err(mismatch()),
        };

        if !matches!(body, QuestionBody::MultiChoice { .. })
            && (wire.checkbox_group_name.is_some() || wire.occupies_questions.is_some())
        {
            return Err(format!("题目 {} 不是多选题，却携带多选字段", number));
        }
        if body.can_reuse() != wire.can_reuse {
            return Err(format!("题目 {} 的 canReuse 与 content 不一致", number));
        }

        Ok(Self {
            number,
            instruction: wire.instruction,
            body,
            answer: wire.answer,
            explanation: wire.explanation,
        })
    }
}

fn completion_kind(kind: QuestionType) -> Option<CompletionKind> {
    match kind {
        QuestionType::SentenceCompletion => Some(CompletionKind::Sentence),
        QuestionType::SummaryCompletion => Some(CompletionKind::Summary),
        QuestionType::TableCompletion => Some(CompletionKind::Table),
        QuestionType::NotesCompletion => Some(CompletionKind::Notes),
        QuestionType::ShortAnswer => Some(CompletionKind::ShortAnswer),
        _ => None,
    }
}

fn matching_kind(kind: QuestionType) -> Option<MatchingKind> {
    match kind {
        QuestionType::ParagraphMatching => Some(MatchingKind::Paragraph),
        QuestionType::HeadingMatching => Some(MatchingKind::Heading),
        QuestionType::FeatureMatching => Some(MatchingKind::Feature),
        QuestionType::StatementMatching => Some(MatchingKind::Statement),
        QuestionType::SentenceEndingMatching => Some(MatchingKind::SentenceEnding),
        QuestionType::Classification => Some(MatchingKind::Classification),
        _ => None,
    }
}
