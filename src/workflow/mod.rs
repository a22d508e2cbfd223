pub mod doc_ctx;
pub mod doc_flow;

pub use doc_ctx::DocCtx;
pub use doc_flow::{DocumentFlow, FlowOutcome, Rendered};
