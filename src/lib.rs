//! # symdex - fuzzy symbol search for TypeScript projects
//!
//! symdex indexes the files, classes, interfaces, functions and methods of
//! one or more TypeScript projects and finds them with weighted fuzzy
//! matching, optionally re-ranked by an AI service.
//!
//! ## Architecture
//!
//! - [`index`] - project discovery, parsing and element emission
//! - [`query`] - weighted multi-field fuzzy search
//! - [`rerank`] - cached AI re-ranking with in-flight de-duplication
//! - [`tui`] - interactive session (debounce, mode toggle, stale suppression)
//! - [`output`] - grouped listing and flat JSON export
//! - [`workspace`] - the context shared by every front end
//!
//! ## Quick Start
//!
//! ```no_run
//! use symdex::config::AppConfig;
//! use symdex::index::IndexOptions;
//! use symdex::workspace::Workspace;
//! use std::path::PathBuf;
//!
//! let config = AppConfig::default();
//! let roots = vec![PathBuf::from("/path/to/project")];
//! let workspace = Workspace::build(&roots, &config, IndexOptions::default()).unwrap();
//!
//! for result in workspace.engine().search("usr servce", 10) {
//!     println!("{} {:.3}", result.element.qualified_name(), result.score);
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod rerank;
pub mod tui;
pub mod utils;
pub mod workspace;
