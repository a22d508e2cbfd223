//! 题号连续性服务 - 业务能力层
//!
//! 按文档顺序维护"下一个期望题号"，多选题按占用题数前进。
//! 计数器是本函数内的局部状态，不同文档之间互不影响。

use tracing::debug;

use crate::error::{Finding, FindingCategory, PipelineError, PipelineResult};
use crate::models::{Difficulty, Question};
use crate::services::answer_binder::BoundQuestion;

/// 定号并检查连续性
///
/// 断档或重复是致命错误；超出难度建议范围或题组声明区间只记警告
pub fn resolve(
    bound: Vec<BoundQuestion>,
    difficulty: Difficulty,
    findings: &mut Vec<Finding>,
) -> PipelineResult<Vec<Question>> {
    let Some(first) = bound.first() else {
        return Ok(Vec::new());
    };

    let (range_start, range_end) = difficulty.number_range();
    let mut expected = first.question.number;
    let mut questions = Vec::with_capacity(bound.len());

    for BoundQuestion {
        mut question,
        group_range,
    } in bound
    {
        if question.number != expected {
            return Err(PipelineError::Continuity {
                question: question.number,
                expected,
                found: question.number,
            });
        }
        question.number = expected;

        let span = question.body.occupies().max(1);
        let next = expected.checked_add(span).ok_or_else(|| {
            PipelineError::extraction(Some(expected), "questionNumber", "题号超出可表示的范围")
        })?;
        let last = next - 1;

        if expected < range_start || last > range_end {
            findings.push(Finding::warning(
                FindingCategory::Content,
                Some(expected),
                format!(
                    "题号 {}-{} 超出难度 {} 的建议范围 [{}, {}]",
                    expected, last, difficulty as u8, range_start, range_end
                ),
            ));
        }
        if let Some((start, end)) = group_range {
            if expected < start || last > end {
                findings.push(Finding::warning(
                    FindingCategory::Content,
                    Some(expected),
                    format!("题号 {}-{} 不在题组声明的区间 {}-{} 内", expected, last, start, end),
                ));
            }
        }

        expected = next;
        questions.push(question);
    }

    debug!("题号校验通过，下一个期望题号 {}", expected);
    Ok(questions)
}

/// 按题目顺序计算下一个期望题号（空列表或溢出时返回 None）
pub fn next_expected(questions: &[Question]) -> Option<u32> {
    let last = questions.last()?;
    last.number.checked_add(last.body.occupies().max(1))
}
