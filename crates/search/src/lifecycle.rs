//! Engine lifecycle
//!
//! `Uninitialized → Building → Ready` on success, `Building → Failed` when
//! the corpus cannot be produced. There is no way back from `Ready`; a new
//! construction may only start from `Uninitialized` or `Failed`. Queries are
//! only answered in `Ready`.

use crate::engine::LexicalEngine;
use crate::errors::SearchError;
use crate::ranking::{join_terms, RankedTerm};
use crate::KnowledgeSearch;
use serde::Serialize;
use sitechat_common::metrics;
use sitechat_ingestion::{CorpusLoader, IngestionError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Externally visible lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Uninitialized,
    Building,
    Ready,
    Failed,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineStatus::Uninitialized => "uninitialized",
            EngineStatus::Building => "building",
            EngineStatus::Ready => "ready",
            EngineStatus::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone)]
enum EngineState {
    Uninitialized,
    Building,
    Ready(Arc<LexicalEngine>),
    Failed(Arc<str>),
}

impl EngineState {
    fn status(&self) -> EngineStatus {
        match self {
            EngineState::Uninitialized => EngineStatus::Uninitialized,
            EngineState::Building => EngineStatus::Building,
            EngineState::Ready(_) => EngineStatus::Ready,
            EngineState::Failed(_) => EngineStatus::Failed,
        }
    }
}

/// Shared handle to the search engine and its lifecycle state.
///
/// Cloning is cheap; all clones observe the same engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    state: Arc<watch::Sender<EngineState>>,
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHandle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(EngineState::Uninitialized);
        Self {
            state: Arc::new(state),
        }
    }

    /// Handle that is already `Ready` with the given engine
    pub fn ready(engine: LexicalEngine) -> Self {
        let (state, _) = watch::channel(EngineState::Ready(Arc::new(engine)));
        Self {
            state: Arc::new(state),
        }
    }

    pub fn status(&self) -> EngineStatus {
        self.state.borrow().status()
    }

    /// Why the last construction failed, if it did
    pub fn failure_reason(&self) -> Option<String> {
        match &*self.state.borrow() {
            EngineState::Failed(reason) => Some(reason.to_string()),
            _ => None,
        }
    }

    /// The built engine, when `Ready`
    pub fn engine(&self) -> Option<Arc<LexicalEngine>> {
        match &*self.state.borrow() {
            EngineState::Ready(engine) => Some(engine.clone()),
            _ => None,
        }
    }

    /// Build the engine from a corpus future.
    ///
    /// Errors from the corpus are returned and leave the handle `Failed`.
    /// Dropping the returned future mid-build also leaves it `Failed`.
    #[instrument(skip_all)]
    pub async fn initialize<F>(&self, corpus: F) -> Result<Arc<LexicalEngine>, SearchError>
    where
        F: Future<Output = Result<String, IngestionError>>,
    {
        let mut rejected = None;
        self.state.send_if_modified(|state| match state {
            EngineState::Uninitialized | EngineState::Failed(_) => {
                *state = EngineState::Building;
                true
            }
            other => {
                rejected = Some(other.status());
                false
            }
        });
        if let Some(status) = rejected {
            return Err(SearchError::AlreadyInitialized { status });
        }

        let mut guard = BuildGuard {
            state: &self.state,
            finished: false,
        };
        let start = Instant::now();
        info!("Building search engine");

        let built = match corpus.await {
            Ok(corpus) => tokio::task::spawn_blocking(move || LexicalEngine::from_corpus(corpus))
                .await
                .map_err(|e| SearchError::ConstructionFailed {
                    reason: format!("index build task failed: {}", e),
                }),
            Err(e) => Err(SearchError::Build(e)),
        };
        guard.finished = true;

        let elapsed = start.elapsed().as_secs_f64();
        match built {
            Ok(engine) => {
                let engine = Arc::new(engine);
                metrics::record_engine_build(elapsed, true, engine.table().len());
                info!(
                    distinct_terms = engine.table().len(),
                    total_tokens = engine.table().total_tokens(),
                    fingerprint = %engine.table().fingerprint(),
                    elapsed_secs = elapsed,
                    "Search engine ready"
                );
                self.state.send_replace(EngineState::Ready(engine.clone()));
                Ok(engine)
            }
            Err(e) => {
                metrics::record_engine_build(elapsed, false, 0);
                error!(error = %e, "Search engine construction failed");
                self.state.send_replace(EngineState::Failed(e.to_string().into()));
                Err(e)
            }
        }
    }

    /// Load the corpus with `loader` and build the engine on a background task
    pub fn spawn_build(&self, loader: CorpusLoader) -> JoinHandle<Result<Arc<LexicalEngine>, SearchError>> {
        let handle = self.clone();
        tokio::spawn(async move { handle.initialize(async move { loader.load().await }).await })
    }

    /// Wait until the engine is `Ready` (or report why it never will be)
    pub async fn wait_ready(&self) -> Result<Arc<LexicalEngine>, SearchError> {
        let mut rx = self.state.subscribe();
        loop {
            let settled = match &*rx.borrow_and_update() {
                EngineState::Ready(engine) => Some(Ok(engine.clone())),
                EngineState::Failed(reason) => Some(Err(SearchError::ConstructionFailed {
                    reason: reason.to_string(),
                })),
                EngineState::Uninitialized | EngineState::Building => None,
            };
            if let Some(result) = settled {
                return result;
            }
            if rx.changed().await.is_err() {
                return Err(SearchError::QueryOnUninitializedEngine {
                    status: self.status(),
                });
            }
        }
    }

    /// Answer a query against the built engine.
    ///
    /// Fails with `QueryOnUninitializedEngine` unless the engine is `Ready`.
    pub fn query_now(&self, text: &str) -> Result<String, SearchError> {
        self.ranked_terms_now(text).map(|terms| join_terms(&terms))
    }

    /// Rank the query's terms against the built engine, recording one
    /// search metric. Same readiness rule as [`EngineHandle::query_now`].
    pub fn ranked_terms_now(&self, text: &str) -> Result<Vec<RankedTerm>, SearchError> {
        let start = Instant::now();

        let engine = match &*self.state.borrow() {
            EngineState::Ready(engine) => engine.clone(),
            other => {
                metrics::record_search(start.elapsed().as_secs_f64(), "not_ready");
                return Err(SearchError::QueryOnUninitializedEngine {
                    status: other.status(),
                });
            }
        };

        let terms = engine.ranked_terms(text);
        let outcome = if terms.is_empty() { "miss" } else { "hit" };
        metrics::record_search(start.elapsed().as_secs_f64(), outcome);

        Ok(terms)
    }
}

#[async_trait::async_trait]
impl KnowledgeSearch for EngineHandle {
    async fn query(&self, text: &str) -> Result<String, SearchError> {
        self.query_now(text)
    }

    fn status(&self) -> EngineStatus {
        EngineHandle::status(self)
    }
}

/// Marks the engine `Failed` if construction is abandoned mid-flight
struct BuildGuard<'a> {
    state: &'a watch::Sender<EngineState>,
    finished: bool,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Search engine construction cancelled");
            self.state
                .send_replace(EngineState::Failed(Arc::from("construction cancelled")));
        }
    }
}
