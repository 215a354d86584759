use crate::error::RerankError;
use crate::index::types::SearchResult;
use crate::output::flat_payload;
use crate::query::QueryEngine;
use crate::rerank::client::{RankRequest, RankingClient};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Candidates fetched per requested result
pub const OVERSAMPLE_FACTOR: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    limit: usize,
}

type Ranked = Arc<[SearchResult]>;

/// Outcome of one external request, seen by every caller that waited on it
type Outcome = Result<Ranked, Arc<RerankError>>;

/// One outstanding request
type Slot = Arc<OnceCell<Outcome>>;

struct Entries {
    /// Completed rankings; the only part subject to eviction
    done: LruCache<CacheKey, Ranked>,
    /// Requests still running, never evicted
    pending: HashMap<CacheKey, Slot>,
}

enum Lookup {
    Hit(Ranked),
    Wait(Slot),
}

/// Memoized AI re-ranking of query results.
///
/// Entries are keyed by `(query, limit)`. Concurrent callers of an uncached
/// key wait on the same request and share its outcome, success or failure.
/// A failed request is forgotten so the next call retries. The map lock is
/// only held to look up or settle an entry, never across an `.await`.
pub struct Reranker {
    engine: QueryEngine,
    client: Arc<dyn RankingClient>,
    entries: Mutex<Entries>,
}

impl Reranker {
    /// `capacity` of `None` keeps every completed entry for the life of the process
    pub fn new(
        engine: QueryEngine,
        client: Arc<dyn RankingClient>,
        capacity: Option<NonZeroUsize>,
    ) -> Self {
        let done = match capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            engine,
            client,
            entries: Mutex::new(Entries {
                done,
                pending: HashMap::new(),
            }),
        }
    }

    pub async fn rerank(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, RerankError> {
        let key = CacheKey {
            query: query.to_string(),
            limit,
        };
        let slot = match self.lookup(&key) {
            Lookup::Hit(ranked) => {
                debug!(query, limit, "rerank cache hit");
                return Ok(ranked.to_vec());
            }
            Lookup::Wait(slot) => slot,
        };

        let outcome = slot
            .get_or_init(|| async { self.fetch(query, limit).await.map_err(Arc::new) })
            .await
            .clone();
        self.settle(key, &slot, &outcome);

        match outcome {
            Ok(ranked) => Ok(ranked.to_vec()),
            Err(err) => Err(RerankError::Shared(err)),
        }
    }

    /// Number of completed entries
    pub fn cached_len(&self) -> usize {
        self.lock().done.len()
    }

    /// Number of requests still running
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &CacheKey) -> Lookup {
        let mut entries = self.lock();
        if let Some(ranked) = entries.done.get(key) {
            return Lookup::Hit(Arc::clone(ranked));
        }
        let slot = entries
            .pending
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()));
        Lookup::Wait(Arc::clone(slot))
    }

    /// Move a finished request out of `pending`; only the first caller of a
    /// slot gets past the identity check
    fn settle(&self, key: CacheKey, slot: &Slot, outcome: &Outcome) {
        let mut entries = self.lock();
        let current = entries
            .pending
            .get(&key)
            .is_some_and(|pending| Arc::ptr_eq(pending, slot));
        if !current {
            return;
        }
        entries.pending.remove(&key);
        if let Ok(ranked) = outcome {
            entries.done.put(key, Arc::clone(ranked));
        }
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Ranked, RerankError> {
        if limit == 0 {
            return Ok(Arc::from(Vec::new()));
        }

        let candidates = self
            .engine
            .search(query, limit.saturating_mul(OVERSAMPLE_FACTOR));
        if candidates.is_empty() {
            return Ok(Arc::from(Vec::new()));
        }

        let request = RankRequest {
            query: query.to_string(),
            limit,
            candidates: flat_payload(&candidates),
        };
        let ids = self.client.rank(&request).await?;
        let ranked = select_ranked(candidates, &ids, limit);

        info!(
            query,
            limit,
            candidates = request.candidates.len(),
            returned = ranked.len(),
            "reranked"
        );
        Ok(Arc::from(ranked))
    }
}

/// Candidates in the order of `ids`. Unknown ids are dropped, repeated ids
/// collapse to their first position and at most `limit` results are kept.
pub fn select_ranked(candidates: Vec<SearchResult>, ids: &[String], limit: usize) -> Vec<SearchResult> {
    let by_id: HashMap<String, usize> = candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.element.id.clone(), idx))
        .collect();

    let mut slots: Vec<Option<SearchResult>> = candidates.into_iter().map(Some).collect();
    let mut ranked = Vec::with_capacity(limit.min(slots.len()));

    for id in ids {
        if ranked.len() >= limit {
            break;
        }
        match by_id.get(id) {
            Some(&idx) => {
                if let Some(result) = slots[idx].take() {
                    ranked.push(result);
                }
            }
            None => debug!(id = %id, "ranking returned unknown id"),
        }
    }
    ranked
}
