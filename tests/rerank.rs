mod common;

use async_trait::async_trait;
use common::service_project;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use symdex::error::RerankError;
use symdex::index::{build_elements, IndexOptions, RootFailurePolicy};
use symdex::query::SearchConfig;
use symdex::rerank::{RankRequest, RankingClient, Reranker, OVERSAMPLE_FACTOR};
use symdex::workspace::Workspace;

/// Ranks candidates in reverse order and records every request
#[derive(Default)]
struct ReverseRanker {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    extra_ids: Vec<String>,
    requests: Mutex<Vec<(String, usize, usize)>>,
}

impl ReverseRanker {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankingClient for ReverseRanker {
    async fn rank(&self, request: &RankRequest) -> Result<Vec<String>, RerankError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            request.query.clone(),
            request.limit,
            request.candidates.len(),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RerankError::EmptyResponse);
        }

        let mut ids = self.extra_ids.clone();
        ids.extend(request.candidates.iter().rev().map(|c| c.id.clone()));
        Ok(ids)
    }
}

fn setup(ranker: ReverseRanker, capacity: Option<usize>) -> (common::Fixture, Workspace, Arc<ReverseRanker>) {
    let project = service_project();
    let elements = build_elements(
        &[project.root()],
        IndexOptions {
            root_failure: RootFailurePolicy::Abort,
            quiet: true,
        },
    )
    .unwrap();
    let ranker = Arc::new(ranker);
    let ws = Workspace::from_elements(elements, &SearchConfig::default())
        .with_ranker(ranker.clone(), capacity.and_then(NonZeroUsize::new));
    (project, ws, ranker)
}

fn reranker(ws: &Workspace) -> &Reranker {
    ws.reranker().unwrap()
}

#[tokio::test]
async fn test_repeated_query_is_cached() {
    let (_project, ws, ranker) = setup(ReverseRanker::default(), None);

    let first = reranker(&ws).rerank("user", 3).await.unwrap();
    let second = reranker(&ws).rerank("user", 3).await.unwrap();

    assert_eq!(ranker.calls(), 1);
    assert_eq!(first.len(), 3);
    let ids = |r: &[symdex::index::SearchResult]| r.iter().map(|r| r.element.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(reranker(&ws).cached_len(), 1);
}

#[tokio::test]
async fn test_results_follow_ranking_order() {
    let (_project, ws, _ranker) = setup(ReverseRanker::default(), None);

    let fuzzy = ws.engine().search("user", 3 * OVERSAMPLE_FACTOR);
    let ranked = reranker(&ws).rerank("user", 3).await.unwrap();

    let expected: Vec<&str> = fuzzy.iter().rev().take(3).map(|r| r.element.id.as_str()).collect();
    let got: Vec<&str> = ranked.iter().map(|r| r.element.id.as_str()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_request_is_oversampled() {
    let (_project, ws, ranker) = setup(ReverseRanker::default(), None);
    reranker(&ws).rerank("user", 2).await.unwrap();

    let requests = ranker.requests.lock().unwrap().clone();
    let available = ws.engine().search("user", 2 * OVERSAMPLE_FACTOR).len();
    assert_eq!(requests, vec![("user".to_string(), 2, available)]);
    assert!(available > 2);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_request() {
    let ranker = ReverseRanker {
        delay: Some(Duration::from_millis(50)),
        ..ReverseRanker::default()
    };
    let (_project, ws, ranker) = setup(ranker, None);

    let rr = reranker(&ws);
    let (a, b, c) = tokio::join!(rr.rerank("user", 3), rr.rerank("user", 3), rr.rerank("user", 3));

    assert_eq!(ranker.calls(), 1);
    let a = a.unwrap();
    assert_eq!(a.len(), b.unwrap().len());
    assert_eq!(a.len(), c.unwrap().len());
}

#[tokio::test]
async fn test_limit_is_part_of_the_key() {
    let (_project, ws, ranker) = setup(ReverseRanker::default(), None);

    reranker(&ws).rerank("user", 2).await.unwrap();
    reranker(&ws).rerank("user", 3).await.unwrap();
    reranker(&ws).rerank("User", 3).await.unwrap();

    assert_eq!(ranker.calls(), 3);
    assert_eq!(reranker(&ws).cached_len(), 3);
}

#[tokio::test]
async fn test_unknown_ids_are_dropped() {
    let ranker = ReverseRanker {
        extra_ids: vec!["class-999".to_string(), "not-an-id".to_string()],
        ..ReverseRanker::default()
    };
    let (_project, ws, _ranker) = setup(ranker, None);

    let ranked = reranker(&ws).rerank("user", 3).await.unwrap();
    assert_eq!(ranked.len(), 3);
    assert!(ranked.iter().all(|r| r.element.id != "class-999"));
}

#[tokio::test]
async fn test_failure_is_not_cached() {
    let ranker = ReverseRanker {
        failures_left: AtomicUsize::new(1),
        ..ReverseRanker::default()
    };
    let (_project, ws, ranker) = setup(ranker, None);

    let err = reranker(&ws).rerank("user", 3).await.unwrap_err();
    assert!(matches!(err.root_cause(), RerankError::EmptyResponse));
    assert_eq!(reranker(&ws).cached_len(), 0);
    assert_eq!(reranker(&ws).pending_len(), 0);

    let ranked = reranker(&ws).rerank("user", 3).await.unwrap();
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranker.calls(), 2);
}

#[tokio::test]
async fn test_bounded_cache_evicts_least_recent() {
    let (_project, ws, ranker) = setup(ReverseRanker::default(), Some(1));

    reranker(&ws).rerank("user", 3).await.unwrap();
    reranker(&ws).rerank("auth", 3).await.unwrap();
    reranker(&ws).rerank("user", 3).await.unwrap();

    assert_eq!(ranker.calls(), 3);
    assert_eq!(reranker(&ws).cached_len(), 1);
}

#[tokio::test]
async fn test_bounded_cache_keeps_requests_in_flight() {
    let ranker = ReverseRanker {
        delay: Some(Duration::from_millis(50)),
        ..ReverseRanker::default()
    };
    let (_project, ws, ranker) = setup(ranker, Some(1));

    let rr = reranker(&ws);
    let (first, other, again) = tokio::join!(
        rr.rerank("user", 3),
        rr.rerank("auth", 3),
        rr.rerank("user", 3)
    );

    assert_eq!(ranker.calls(), 2);
    let ids = |r: Vec<symdex::index::SearchResult>| r.into_iter().map(|r| r.element.id).collect::<Vec<_>>();
    assert_eq!(ids(first.unwrap()), ids(again.unwrap()));
    assert!(other.is_ok());
    assert_eq!(rr.cached_len(), 1);
    assert_eq!(rr.pending_len(), 0);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_failure() {
    let ranker = ReverseRanker {
        delay: Some(Duration::from_millis(50)),
        failures_left: AtomicUsize::new(1),
        ..ReverseRanker::default()
    };
    let (_project, ws, ranker) = setup(ranker, None);

    let rr = reranker(&ws);
    let (a, b, c) = tokio::join!(rr.rerank("user", 3), rr.rerank("user", 3), rr.rerank("user", 3));

    assert_eq!(ranker.calls(), 1);
    for outcome in [a, b, c] {
        let err = outcome.unwrap_err();
        assert!(matches!(err.root_cause(), RerankError::EmptyResponse));
        assert_eq!(err.to_string(), "ranking service returned no choices");
    }
    assert_eq!(rr.pending_len(), 0);

    // The failure is not remembered
    assert_eq!(rr.rerank("user", 3).await.unwrap().len(), 3);
    assert_eq!(ranker.calls(), 2);
}

#[tokio::test]
async fn test_nothing_to_rank_skips_the_service() {
    let (_project, ws, ranker) = setup(ReverseRanker::default(), None);

    assert!(reranker(&ws).rerank("user", 0).await.unwrap().is_empty());

    let config = SearchConfig {
        threshold: 0.0,
        ..SearchConfig::default()
    };
    let strict = Workspace::from_elements(ws.elements().to_vec(), &config)
        .with_ranker(ranker.clone(), None);
    assert!(strict.reranker().unwrap().rerank("zzqqxx", 3).await.unwrap().is_empty());

    assert_eq!(ranker.calls(), 0);
}

#[test]
fn test_workspace_without_ranker() {
    let ws = Workspace::from_elements(Vec::new(), &SearchConfig::default());
    assert!(ws.reranker().is_none());
    assert!(ws.ai_unavailable().is_some());
}
