//! 往返校验服务 - 业务能力层
//!
//! 序列化后立即重新解析并与内存中的文档比较，不一致时不落盘

use crate::error::{Finding, FindingCategory};
use crate::models::ExamDocument;

/// 序列化为输出格式（2 空格缩进、UTF-8、以换行结尾）并做往返校验
///
/// 成功返回待写入的文本；失败返回一条致命的结构问题
pub fn render_checked(doc: &ExamDocument) -> Result<String, Finding> {
    let mut json = serde_json::to_string_pretty(doc).map_err(|e| {
        Finding::fatal(FindingCategory::Structural, None, format!("序列化失败: {}", e))
    })?;
    json.push('\n');

    let reparsed: ExamDocument = serde_json::from_str(&json).map_err(|e| {
        Finding::fatal(
            FindingCategory::Structural,
            None,
            format!("输出无法重新解析: {}", e),
        )
    })?;

    if reparsed != *doc {
        return Err(Finding::fatal(
            FindingCategory::Structural,
            None,
            "输出重新解析后与原文档不一致",
        ));
    }
    Ok(json)
}
