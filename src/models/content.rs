//! 题目内容模型
//!
//! `QuestionBody` 是按交互类别划分的封闭和类型，每个变体只携带本题型的字段，
//! 缺字段在构造时就会暴露，而不是序列化成 null。

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::question_type::QuestionType;

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceOption {
    pub label: String,
    pub text: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// 判断题内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JudgmentContent {
    pub statement: String,
}

/// 单选/多选题内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChoiceContent {
    pub question_text: String,
    pub options: Vec<ChoiceOption>,
}

/// 填空题内容
///
/// 选词填空（word bank）额外携带 `options` 与 `canReuse`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompletionContent {
    pub sentence: String,
    pub word_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_reuse: Option<bool>,
}

/// 匹配题主字段名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptField {
    Statement,
    ParagraphLabel,
    Feature,
    SentenceStart,
    Item,
}

impl PromptField {
    pub fn key(self) -> &'static str {
        match self {
            PromptField::Statement => "statement",
            PromptField::ParagraphLabel => "paragraphLabel",
            PromptField::Feature => "feature",
            PromptField::SentenceStart => "sentenceStart",
            PromptField::Item => "item",
        }
    }

    const ALL: [PromptField; 5] = [
        PromptField::Statement,
        PromptField::ParagraphLabel,
        PromptField::Feature,
        PromptField::SentenceStart,
        PromptField::Item,
    ];
}

/// 匹配题内容
///
/// 主字段的 JSON 键名由 `field` 决定（`statement` / `paragraphLabel` / ...）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingContent {
    pub field: PromptField,
    pub prompt: String,
    pub options: Vec<ChoiceOption>,
    pub can_reuse: bool,
}

impl Serialize for MatchingContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.field.key(), &self.prompt)?;
        map.serialize_entry("options", &self.options)?;
        map.serialize_entry("canReuse", &self.can_reuse)?;
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MatchingWire {
    statement: Option<String>,
    paragraph_label: Option<String>,
    feature: Option<String>,
    sentence_start: Option<String>,
    item: Option<String>,
    options: Vec<ChoiceOption>,
    can_reuse: bool,
}

impl<'de> Deserialize<'de> for MatchingContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = MatchingWire::deserialize(deserializer)?;
        let candidates = [
            wire.statement,
            wire.paragraph_label,
            wire.feature,
            wire.sentence_start,
            wire.item,
        ];
        let mut present = PromptField::ALL
            .into_iter()
            .zip(candidates)
            .filter_map(|(field, value)| value.map(|v| (field, v)));

        let (field, prompt) = present
            .next()
            .ok_or_else(|| D::Error::custom("匹配题缺少主字段"))?;
        if present.next().is_some() {
            return Err(D::Error::custom("匹配题主字段重复"));
        }

        Ok(Self {
            field,
            prompt,
            options: wire.options,
            can_reuse: wire.can_reuse,
        })
    }
}

/// 判断题子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentKind {
    TrueFalseNotGiven,
    YesNoNotGiven,
}

/// 填空题子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Sentence,
    Summary,
    Table,
    Notes,
    ShortAnswer,
}

/// 匹配题子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingKind {
    Paragraph,
    Heading,
    Feature,
    Statement,
    SentenceEnding,
    Classification,
}

impl MatchingKind {
    /// 该子类型允许的主字段
    pub fn allows(self, field: PromptField) -> bool {
        match self {
            MatchingKind::Paragraph | MatchingKind::Statement => field == PromptField::Statement,
            MatchingKind::Heading => field == PromptField::ParagraphLabel,
            MatchingKind::Feature => field == PromptField::Feature,
            MatchingKind::SentenceEnding => field == PromptField::SentenceStart,
            MatchingKind::Classification => {
                matches!(field, PromptField::Statement | PromptField::Item)
            }
        }
    }
}

/// 题目主体：按交互类别划分，每个变体携带自己的字段集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionBody {
    Judgment {
        kind: JudgmentKind,
        content: JudgmentContent,
    },
    SingleChoice(ChoiceContent),
    MultiChoice {
        content: ChoiceContent,
        checkbox_group_name: String,
        occupies_questions: u32,
    },
    Completion {
        kind: CompletionKind,
        content: CompletionContent,
    },
    Matching {
        kind: MatchingKind,
        content: MatchingContent,
    },
}

impl QuestionBody {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionBody::Judgment { kind, .. } => match kind {
                JudgmentKind::TrueFalseNotGiven => QuestionType::TrueFalseNg,
                JudgmentKind::YesNoNotGiven => QuestionType::YesNoNg,
            },
            QuestionBody::SingleChoice(_) => QuestionType::MultipleChoiceSingle,
            QuestionBody::MultiChoice { .. } => QuestionType::MultipleChoiceMultiple,
            QuestionBody::Completion { kind, .. } => match kind {
                CompletionKind::Sentence => QuestionType::SentenceCompletion,
                CompletionKind::Summary => QuestionType::SummaryCompletion,
                CompletionKind::Table => QuestionType::TableCompletion,
                CompletionKind::Notes => QuestionType::NotesCompletion,
                CompletionKind::ShortAnswer => QuestionType::ShortAnswer,
            },
            QuestionBody::Matching { kind, .. } => match kind {
                MatchingKind::Paragraph => QuestionType::ParagraphMatching,
                MatchingKind::Heading => QuestionType::HeadingMatching,
                MatchingKind::Feature => QuestionType::FeatureMatching,
                MatchingKind::Statement => QuestionType::StatementMatching,
                MatchingKind::SentenceEnding => QuestionType::SentenceEndingMatching,
                MatchingKind::Classification => QuestionType::Classification,
            },
        }
    }

    /// 题目级 `canReuse`：匹配题总是有，选词填空题有，其余没有
    pub fn can_reuse(&self) -> Option<bool> {
        match self {
            QuestionBody::Matching { content, .. } => Some(content.can_reuse),
            QuestionBody::Completion { content, .. } => content.can_reuse,
            _ => None,
        }
    }

    /// 题目选项（没有选项的题型返回空切片）
    pub fn options(&self) -> &[ChoiceOption] {
        match self {
            QuestionBody::SingleChoice(content) | QuestionBody::MultiChoice { content, .. } => {
                &content.options
            }
            QuestionBody::Completion { content, .. } => content.options.as_deref().unwrap_or(&[]),
            QuestionBody::Matching { content, .. } => &content.options,
            QuestionBody::Judgment { .. } => &[],
        }
    }

    /// 该题占用的题号数量
    pub fn occupies(&self) -> u32 {
        match self {
            QuestionBody::MultiChoice {
                occupies_questions, ..
            } => *occupies_questions,
            _ => 1,
        }
    }
}

/// 序列化用的 `content` 形状
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentWire {
    Choice(ChoiceContent),
    Completion(CompletionContent),
    Matching(MatchingContent),
    Judgment(JudgmentContent),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching(field: PromptField) -> MatchingContent {
        MatchingContent {
            field,
            prompt: "i".to_string(),
            options: vec![ChoiceOption::new("i", "The first heading")],
            can_reuse: false,
        }
    }

    #[test]
    fn test_matching_content_uses_field_specific_key() {
        let json = serde_json::to_value(matching(PromptField::ParagraphLabel)).unwrap();
        assert_eq!(json["paragraphLabel"], "i");
        assert!(json.get("statement").is_none());
        assert_eq!(json["canReuse"], false);
    }

    #[test]
    fn test_matching_content_rejects_two_primary_fields() {
        let raw = r#"{"statement":"a","feature":"b","options":[],"canReuse":true}"#;
        assert!(serde_json::from_str::<MatchingContent>(raw).is_err());
    }

    #[test]
    fn test_untagged_content_picks_judgment_for_bare_statement() {
        let wire: ContentWire = serde_json::from_str(r#"{"statement":"X"}"#).unwrap();
        assert!(matches!(wire, ContentWire::Judgment(_)));

        let wire: ContentWire =
            serde_json::from_str(r#"{"statement":"X","options":[],"canReuse":false}"#).unwrap();
        assert!(matches!(wire, ContentWire::Matching(_)));
    }

    #[test]
    fn test_classification_allows_item_or_statement() {
        assert!(MatchingKind::Classification.allows(PromptField::Item));
        assert!(MatchingKind::Classification.allows(PromptField::Statement));
        assert!(!MatchingKind::Heading.allows(PromptField::Statement));
    }
}
