pub mod html_loader;

pub use html_loader::{discover_sources, infer_identity, read_source, SourceFile, SourceIdentity};
