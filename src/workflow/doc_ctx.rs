//! 文档处理上下文
//!
//! 封装"我正在处理哪篇文档、它是第几个任务"这一信息

use std::fmt::Display;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocCtx {
    /// 文档编号（eNNN）
    pub document_id: String,

    /// 源文件名
    pub source_name: String,

    /// 任务序号（仅用于日志显示，从 1 开始）
    pub task_index: usize,
}

impl DocCtx {
    pub fn new(document_id: String, source_name: String, task_index: usize) -> Self {
        Self {
            document_id,
            source_name,
            task_index,
        }
    }
}

impl Display for DocCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 {}]", self.document_id)
    }
}
