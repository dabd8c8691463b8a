//! Query ranking
//!
//! A query is answered with its own terms: every query token found in the
//! index is kept, and the kept tokens are ordered by descending corpus
//! frequency. The sort is stable, so equal frequencies keep query order.
//! Duplicate query tokens are kept as-is.

use crate::index::TermFrequencyTable;
use crate::tokenizer::tokenize;
use serde::Serialize;

/// A matched query term with its corpus frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTerm {
    pub term: String,
    pub frequency: usize,
}

/// Matched query terms, most frequent first
pub fn ranked_terms(table: &TermFrequencyTable, text: &str) -> Vec<RankedTerm> {
    let mut hits: Vec<RankedTerm> = tokenize(text)
        .into_iter()
        .filter_map(|term| {
            table
                .frequency(&term)
                .map(|frequency| RankedTerm { term, frequency })
        })
        .collect();

    // Vec::sort_by is stable
    hits.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    hits
}

/// Matched query terms joined with single spaces; `""` when nothing matches
pub fn query(table: &TermFrequencyTable, text: &str) -> String {
    join_terms(&ranked_terms(table, text))
}

/// Ranked terms as the single-line query answer
pub fn join_terms(terms: &[RankedTerm]) -> String {
    terms
        .iter()
        .map(|hit| hit.term.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
