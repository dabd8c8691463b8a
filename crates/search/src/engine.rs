//! Built search engine: the corpus and its frequency index

use crate::index::{build_index, TermFrequencyTable};
use crate::ranking::{self, RankedTerm};
use serde::Serialize;

/// Number of terms reported in [`IndexStats::top_terms`]
const TOP_TERMS: usize = 10;

/// Immutable corpus + index pair. Queries are synchronous and do no I/O.
#[derive(Debug)]
pub struct LexicalEngine {
    corpus: String,
    table: TermFrequencyTable,
}

/// Summary of a built index
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub corpus_chars: usize,
    pub total_tokens: usize,
    pub distinct_terms: usize,
    pub fingerprint: String,
    pub top_terms: Vec<RankedTerm>,
}

impl LexicalEngine {
    pub fn from_corpus(corpus: impl Into<String>) -> Self {
        let corpus = corpus.into();
        let table = build_index(&corpus);
        Self { corpus, table }
    }

    pub fn query(&self, text: &str) -> String {
        ranking::query(&self.table, text)
    }

    pub fn ranked_terms(&self, text: &str) -> Vec<RankedTerm> {
        ranking::ranked_terms(&self.table, text)
    }

    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    pub fn table(&self) -> &TermFrequencyTable {
        &self.table
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            corpus_chars: self.corpus.chars().count(),
            total_tokens: self.table.total_tokens(),
            distinct_terms: self.table.len(),
            fingerprint: self.table.fingerprint(),
            top_terms: self
                .table
                .top_terms(TOP_TERMS)
                .into_iter()
                .map(|(term, frequency)| RankedTerm {
                    term: term.to_string(),
                    frequency,
                })
                .collect(),
        }
    }
}
