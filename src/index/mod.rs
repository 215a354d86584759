pub mod build;
pub mod parser;
pub mod project;
pub mod stats;
pub mod types;

pub use build::{build_elements, IndexOptions, Indexer, RootFailurePolicy};
pub use parser::{SourceParser, TypeScriptParser};
pub use project::ProjectConfig;
pub use types::*;
