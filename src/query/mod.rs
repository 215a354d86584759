//! Weighted fuzzy search over indexed elements.
//!
//! - [`matcher`] - per-field approximate matching ([`FieldMatcher`])
//! - [`scorer`] - search settings and weighted field combination
//! - [`index`] - prepared, read-only [`SearchIndex`]
//! - [`engine`] - the [`QueryEngine`] search contract

pub mod engine;
pub mod index;
pub mod matcher;
pub mod scorer;

pub use engine::QueryEngine;
pub use index::SearchIndex;
pub use matcher::{ApproximateMatcher, FieldMatch, FieldMatcher, Pattern};
pub use scorer::{FieldWeights, SearchConfig};
