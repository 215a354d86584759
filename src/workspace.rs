//! The context built once at startup and shared by every front end

use crate::config::AppConfig;
use crate::error::IndexError;
use crate::index::{build_elements, CodeElement, IndexOptions};
use crate::query::{QueryEngine, SearchConfig, SearchIndex};
use crate::rerank::{OpenAiRanker, RankingClient, Reranker};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Read-only index, query engine and optional reranker
pub struct Workspace {
    engine: QueryEngine,
    reranker: Option<Arc<Reranker>>,
    /// Why AI ranking is unavailable, when it is
    ai_unavailable: Option<String>,
}

impl Workspace {
    /// Index `roots` and connect the configured ranking service
    pub fn build(
        roots: &[PathBuf],
        config: &AppConfig,
        options: IndexOptions,
    ) -> Result<Self, IndexError> {
        let elements = build_elements(roots, options)?;
        let workspace = Self::from_elements(elements, &config.search);

        match OpenAiRanker::from_config(&config.ai) {
            Ok(ranker) => Ok(workspace.with_ranker(Arc::new(ranker), config.ai.cache_capacity())),
            Err(err) => {
                warn!(error = %err, "AI ranking disabled");
                Ok(Self {
                    ai_unavailable: Some(err.to_string()),
                    ..workspace
                })
            }
        }
    }

    pub fn from_elements(elements: Vec<CodeElement>, search: &SearchConfig) -> Self {
        let index = Arc::new(SearchIndex::new(elements, search));
        Self {
            engine: QueryEngine::new(index),
            reranker: None,
            ai_unavailable: Some("no ranking service configured".to_string()),
        }
    }

    pub fn with_ranker(
        self,
        client: Arc<dyn RankingClient>,
        capacity: Option<NonZeroUsize>,
    ) -> Self {
        let reranker = Reranker::new(self.engine.clone(), client, capacity);
        Self {
            reranker: Some(Arc::new(reranker)),
            ai_unavailable: None,
            ..self
        }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn reranker(&self) -> Option<&Arc<Reranker>> {
        self.reranker.as_ref()
    }

    pub fn ai_unavailable(&self) -> Option<&str> {
        self.ai_unavailable.as_deref()
    }

    pub fn elements(&self) -> &[CodeElement] {
        self.engine.index().elements()
    }
}
