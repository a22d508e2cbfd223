//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 管理应用生命周期（初始化、运行）
//! - 扫描输入目录（Vec<SourceFile>）
//! - 控制并发数量（Semaphore）与单篇超时
//! - 写出 report.json 并输出全局统计
//!
//! ### `document_processor` - 单篇文档处理器
//! - 推断编号与难度
//! - 读取源文件
//! - 调用 DocumentFlow
//! - 原子写出 JSON
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SourceFile>)
//!     ↓
//! document_processor (处理单篇文档的 I/O)
//!     ↓
//! workflow::DocumentFlow (处理单篇文档的各个阶段)
//!     ↓
//! services (能力层：提取 / 识别 / 绑定 / 校验 / 报告)
//!     ↓
//! infrastructure (基础设施：DOM、答案脚本)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，document_processor 管单篇
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和汇总，不做具体业务判断

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use document_processor::process_document;
