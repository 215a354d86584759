//! Shared utilities.
//!
//! - [`app_data`] - Application data directory (config and log file locations)
//! - [`jsonc`] - JSON-with-comments reader for `tsconfig.json`
//! - [`progress`] - Spinner that compiles away without the `progress` feature

pub mod app_data;
pub mod jsonc;
pub mod progress;

pub use app_data::*;
pub use jsonc::strip_jsonc;
