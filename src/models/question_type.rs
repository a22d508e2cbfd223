use serde::{Deserialize, Serialize};

/// 交互类别（题目控件的粗粒度形状）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionClass {
    /// 判断题（三选一固定选项）
    Judgment,
    /// 单选题
    SingleChoice,
    /// 多选题
    MultiChoice,
    /// 填空题
    Completion,
    /// 拖拽/匹配题
    DragMatching,
}

impl InteractionClass {
    pub fn name(self) -> &'static str {
        match self {
            InteractionClass::Judgment => "judgment",
            InteractionClass::SingleChoice => "single-choice",
            InteractionClass::MultiChoice => "multi-choice",
            InteractionClass::Completion => "completion",
            InteractionClass::DragMatching => "drag-matching",
        }
    }
}

impl std::fmt::Display for InteractionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 题型枚举（共 15 种题型代码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    TrueFalseNg,
    YesNoNg,
    MultipleChoiceSingle,
    MultipleChoiceMultiple,
    SentenceCompletion,
    SummaryCompletion,
    TableCompletion,
    NotesCompletion,
    ShortAnswer,
    ParagraphMatching,
    HeadingMatching,
    FeatureMatching,
    StatementMatching,
    SentenceEndingMatching,
    Classification,
}

impl QuestionType {
    /// 获取题型代码（输出 JSON 中的 `type` 字段）
    pub fn code(self) -> &'static str {
        match self {
            QuestionType::TrueFalseNg => "true-false-ng",
            QuestionType::YesNoNg => "yes-no-ng",
            QuestionType::MultipleChoiceSingle => "multiple-choice-single",
            QuestionType::MultipleChoiceMultiple => "multiple-choice-multiple",
            QuestionType::SentenceCompletion => "sentence-completion",
            QuestionType::SummaryCompletion => "summary-completion",
            QuestionType::TableCompletion => "table-completion",
            QuestionType::NotesCompletion => "notes-completion",
            QuestionType::ShortAnswer => "short-answer",
            QuestionType::ParagraphMatching => "paragraph-matching",
            QuestionType::HeadingMatching => "heading-matching",
            QuestionType::FeatureMatching => "feature-matching",
            QuestionType::StatementMatching => "statement-matching",
            QuestionType::SentenceEndingMatching => "sentence-ending-matching",
            QuestionType::Classification => "classification",
        }
    }

    /// 题型所属的交互类别
    pub fn interaction_class(self) -> InteractionClass {
        match self {
            QuestionType::TrueFalseNg | QuestionType::YesNoNg => InteractionClass::Judgment,
            QuestionType::MultipleChoiceSingle => InteractionClass::SingleChoice,
            QuestionType::MultipleChoiceMultiple => InteractionClass::MultiChoice,
            QuestionType::SentenceCompletion
            | QuestionType::SummaryCompletion
            | QuestionType::TableCompletion
            | QuestionType::NotesCompletion
            | QuestionType::ShortAnswer => InteractionClass::Completion,
            QuestionType::ParagraphMatching
            | QuestionType::HeadingMatching
            | QuestionType::FeatureMatching
            | QuestionType::StatementMatching
            | QuestionType::SentenceEndingMatching
            | QuestionType::Classification => InteractionClass::DragMatching,
        }
    }

    /// 判断题的合法答案词表
    pub fn judgment_vocabulary(self) -> Option<&'static [&'static str]> {
        match self {
            QuestionType::TrueFalseNg => Some(&["TRUE", "FALSE", "NOT GIVEN"]),
            QuestionType::YesNoNg => Some(&["YES", "NO", "NOT GIVEN"]),
            _ => None,
        }
    }

    pub const ALL: [QuestionType; 15] = [
        QuestionType::TrueFalseNg,
        QuestionType::YesNoNg,
        QuestionType::MultipleChoiceSingle,
        QuestionType::MultipleChoiceMultiple,
        QuestionType::SentenceCompletion,
        QuestionType::SummaryCompletion,
        QuestionType::TableCompletion,
        QuestionType::NotesCompletion,
        QuestionType::ShortAnswer,
        QuestionType::ParagraphMatching,
        QuestionType::HeadingMatching,
        QuestionType::FeatureMatching,
        QuestionType::StatementMatching,
        QuestionType::SentenceEndingMatching,
        QuestionType::Classification,
    ];
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
