pub mod answer_binder;
pub mod answer_table;
pub mod auditor;
pub mod document_assembler;
pub mod field_extractor;
pub mod group_walker;
pub mod numbering_resolver;
pub mod passage_extractor;
pub mod report_writer;
pub mod type_classifier;
pub mod validator;

pub use answer_table::AnswerTable;
pub use report_writer::{DocumentOutcome, ReportWriter, RunReport};
