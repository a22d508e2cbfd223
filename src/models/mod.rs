pub mod answer;
pub mod content;
pub mod exam;
pub mod loaders;
pub mod question_type;

pub use answer::AnswerValue;
pub use content::{
    ChoiceContent, ChoiceOption, CompletionContent, CompletionKind, JudgmentContent, JudgmentKind,
    MatchingContent, MatchingKind, PromptField, QuestionBody,
};
pub use exam::{Difficulty, ExamDocument, Metadata, Paragraph, Passage, Question};
pub use loaders::{discover_sources, infer_identity, read_source, SourceFile, SourceIdentity};
pub use question_type::{InteractionClass, QuestionType};
