//! # Exam Ingest
//!
//! 将雅思阅读真题网页（HTML）转换为经过校验的结构化 JSON
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 只读的 DOM 视图和答案脚本解析，只暴露能力
//! - `ExamPage` - 解析后的页面，提供选择、遍历、取文本能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个模块只做一件事
//! - `answer_table` / `passage_extractor` / `group_walker` - 三路提取
//! - `type_classifier` / `field_extractor` - 题型识别与字段提取
//! - `answer_binder` / `numbering_resolver` - 答案绑定与题号校验
//! - `document_assembler` / `validator` / `auditor` - 组装、校验、往返校验
//! - `ReportWriter` - 写 report.json 与错误日志能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文档"的完整处理流程
//! - `DocCtx` - 上下文封装（document_id + task_index）
//! - `DocumentFlow` - 流程编排（提取 → 识别 → 绑定 → 校验 → 输出）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，管理并发、超时和报告
//! - `orchestrator/document_processor` - 单篇文档处理器，负责读入与原子写出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, Finding, FindingCategory, PipelineError, Severity};
pub use infrastructure::ExamPage;
pub use models::{ExamDocument, Question, QuestionType};
pub use orchestrator::{process_document, App};
pub use services::{DocumentOutcome, RunReport};
pub use workflow::{DocCtx, DocumentFlow, FlowOutcome};
