//! 文档组装服务 - 业务能力层
//!
//! 组合编号、文章、题目并计算元数据

use crate::models::{Difficulty, ExamDocument, Metadata, Passage, Question, QuestionType};

/// 组装最终文档
pub fn assemble(
    id: impl Into<String>,
    difficulty: Difficulty,
    passage: Passage,
    questions: Vec<Question>,
) -> ExamDocument {
    let metadata = Metadata {
        difficulty,
        total_questions: questions.len(),
        question_types: dedupe_types(&questions),
    };
    ExamDocument {
        id: id.into(),
        passage,
        questions,
        metadata,
    }
}

/// 按首次出现顺序去重的题型列表
pub fn dedupe_types(questions: &[Question]) -> Vec<QuestionType> {
    let mut types = Vec::new();
    for question in questions {
        let kind = question.question_type();
        if !types.contains(&kind) {
            types.push(kind);
        }
    }
    types
}
