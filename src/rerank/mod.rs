//! AI re-ranking of query results.
//!
//! [`Reranker`] oversamples candidates from the query engine, asks a
//! [`RankingClient`] to order them and memoizes the answer per
//! `(query, limit)`.

pub mod cache;
pub mod client;

pub use cache::{select_ranked, Reranker, OVERSAMPLE_FACTOR};
pub use client::{OpenAiRanker, RankRequest, RankingClient};
