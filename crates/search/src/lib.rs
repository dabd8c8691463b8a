//! SiteChat Search
//!
//! In-memory lexical search over the site knowledge corpus:
//! - Term frequency index built once from the corpus
//! - Ranked term queries (matched query terms by descending corpus frequency)
//! - Engine lifecycle: Uninitialized → Building → Ready | Failed

pub mod engine;
pub mod errors;
pub mod index;
pub mod lifecycle;
pub mod ranking;
pub mod tokenizer;

pub use engine::{IndexStats, LexicalEngine};
pub use errors::SearchError;
pub use index::{build_index, TermFrequencyTable};
pub use lifecycle::{EngineHandle, EngineStatus};
pub use ranking::{join_terms, query, ranked_terms, RankedTerm};
pub use tokenizer::tokenize;

/// The query entry point offered to callers of the search engine
#[async_trait::async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Rank the query's terms against the corpus; `""` when nothing matches
    async fn query(&self, text: &str) -> Result<String, SearchError>;

    /// Current lifecycle status of the engine
    fn status(&self) -> EngineStatus;
}
