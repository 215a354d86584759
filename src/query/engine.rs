use crate::index::types::SearchResult;
use crate::query::index::SearchIndex;
use crate::query::matcher::Pattern;
use std::sync::Arc;
use tracing::debug;

/// Synchronous fuzzy search over a shared [`SearchIndex`]
#[derive(Clone)]
pub struct QueryEngine {
    index: Arc<SearchIndex>,
}

impl QueryEngine {
    pub fn new(index: Arc<SearchIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Best `limit` matches for `query`, ascending by distance.
    ///
    /// An empty query returns the first `limit` elements in indexing order
    /// with score 0. Equal scores keep indexing order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        if limit == 0 {
            return Vec::new();
        }

        let Some(pattern) = Pattern::new(query) else {
            return self
                .index
                .elements()
                .iter()
                .take(limit)
                .map(|element| SearchResult::new(element.clone(), 0.0))
                .collect();
        };

        let mut hits = self.index.score_all(&pattern);
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let matched = hits.len();
        let results: Vec<SearchResult> = hits
            .into_iter()
            .take(limit)
            .filter_map(|(idx, score)| {
                self.index
                    .get(idx)
                    .map(|element| SearchResult::new(element.clone(), score))
            })
            .collect();

        debug!(query, limit, matched, returned = results.len(), "search");
        results
    }
}
