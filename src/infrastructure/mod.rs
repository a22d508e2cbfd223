//! 基础设施层（Infrastructure Layer）
//!
//! 持有解析后的页面，只暴露能力：
//! - `dom` - 文档规整器，选择节点并取规整文本
//! - `answer_script` - 内联脚本对象字面量的容错解析器

pub mod answer_script;
pub mod dom;

pub use dom::ExamPage;
