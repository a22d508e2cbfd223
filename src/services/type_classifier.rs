//! 题型识别服务 - 业务能力层
//!
//! 只看结构信号（控件形状、选项数量与形状、所在块形状），不理解题目文字。
//! 规则按顺序匹配，第一个命中的生效；都不命中则为致命的识别失败。

use crate::error::{PipelineError, PipelineResult};
use crate::models::{ChoiceOption, QuestionType};
use crate::services::field_extractor::{choice_count, ends_like_sentence};
use crate::services::group_walker::{BlockShape, Control, PoolKind, QuestionGroup, QuestionNode};
use crate::services::passage_extractor::is_paragraph_label;

/// 识别单个节点的题型
pub fn classify(node: &QuestionNode, group: &QuestionGroup) -> PipelineResult<QuestionType> {
    let fail = |reason: &str| PipelineError::Classification {
        position: node.position.to_string(),
        reason: reason.to_string(),
    };

    match node.control {
        Control::ChooseOne => {
            if let Some(kind) = judgment_kind(&node.options) {
                return Ok(kind);
            }
            if node.options.len() < 2 {
                return Err(fail("单选控件的选项不足两个"));
            }
            // 每题一组 radio 但说明要求选多个，按多选处理
            if node.numbers.len() > 1 || choice_count(&group.instruction).is_some() {
                return Ok(QuestionType::MultipleChoiceMultiple);
            }
            Ok(QuestionType::MultipleChoiceSingle)
        }
        Control::ChooseMany => Ok(QuestionType::MultipleChoiceMultiple),
        Control::FreeText => match node.block {
            BlockShape::Table => Ok(QuestionType::TableCompletion),
            BlockShape::List => Ok(QuestionType::NotesCompletion),
            BlockShape::Summary => Ok(QuestionType::SummaryCompletion),
            BlockShape::Sentence => Ok(QuestionType::SentenceCompletion),
            BlockShape::Detached => Ok(QuestionType::ShortAnswer),
            _ => Err(fail("输入框所在块的形状无法识别")),
        },
        Control::Pairing => classify_matching(node, group).ok_or_else(|| fail("拖拽题没有选项")),
    }
}

/// 三个固定选项且词表吻合 → 判断题
fn judgment_kind(options: &[ChoiceOption]) -> Option<QuestionType> {
    if options.len() != 3 {
        return None;
    }
    let labels: Vec<String> = options
        .iter()
        .map(|option| option.label.trim().to_uppercase())
        .collect();

    [QuestionType::TrueFalseNg, QuestionType::YesNoNg]
        .into_iter()
        .find(|kind| {
            kind.judgment_vocabulary()
                .is_some_and(|vocabulary| {
                    vocabulary
                        .iter()
                        .all(|word| labels.iter().any(|l| l.as_str() == *word))
                })
        })
}

/// 按选项池的形状区分六种匹配题
fn classify_matching(node: &QuestionNode, group: &QuestionGroup) -> Option<QuestionType> {
    if node.block == BlockShape::HeadingTarget || node.pool == Some(PoolKind::Headings) {
        return Some(QuestionType::HeadingMatching);
    }
    if node.options.is_empty() {
        return None;
    }
    if node.options.iter().all(|o| is_roman_lower(&o.label)) {
        return Some(QuestionType::HeadingMatching);
    }

    let instruction = group.instruction.to_lowercase();
    if node.block == BlockShape::Grid {
        return Some(grid_kind(&instruction));
    }

    if node
        .options
        .iter()
        .all(|o| o.text == o.label && is_paragraph_label(&o.label))
    {
        return Some(QuestionType::ParagraphMatching);
    }

    let fragments = node
        .options
        .iter()
        .filter(|o| o.text.starts_with(|c: char| c.is_lowercase()))
        .count();
    if fragments * 2 >= node.options.len() {
        return Some(QuestionType::SentenceEndingMatching);
    }

    if node.options.len() <= 3 {
        return Some(QuestionType::Classification);
    }

    Some(if ends_like_sentence(&node.prompt) {
        QuestionType::StatementMatching
    } else {
        QuestionType::FeatureMatching
    })
}

/// 表格形式的匹配题只能从说明文字区分，按关键词顺序取第一个命中的
fn grid_kind(instruction: &str) -> QuestionType {
    const RULES: [(&[&str], QuestionType); 4] = [
        (&["heading"], QuestionType::HeadingMatching),
        (&["paragraph"], QuestionType::ParagraphMatching),
        (&["classify", "classification"], QuestionType::Classification),
        (&["feature", "person", "people"], QuestionType::FeatureMatching),
    ];
    RULES
        .iter()
        .find(|(words, _)| words.iter().any(|word| instruction.contains(word)))
        .map_or(QuestionType::Classification, |(_, kind)| *kind)
}

fn is_roman_lower(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| matches!(c, 'i' | 'v' | 'x' | 'l'))
}
