//! Term frequency index

use crate::tokenizer::tokenize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Occurrence count of every normalized term in the corpus.
///
/// Keys are non-empty lowercase tokens without whitespace; counts are
/// always at least 1. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFrequencyTable {
    counts: HashMap<String, usize>,
    total_tokens: usize,
}

/// Tokenize the corpus and count every token
pub fn build_index(corpus: &str) -> TermFrequencyTable {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total_tokens = 0;

    for token in tokenize(corpus) {
        *counts.entry(token).or_insert(0) += 1;
        total_tokens += 1;
    }

    TermFrequencyTable {
        counts,
        total_tokens,
    }
}

impl TermFrequencyTable {
    /// Corpus frequency of an already normalized term
    pub fn frequency(&self, term: &str) -> Option<usize> {
        self.counts.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.counts.contains_key(term)
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of tokens in the corpus
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// The `limit` most frequent terms, ties broken alphabetically
    pub fn top_terms(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }

    /// SHA-256 over the sorted entries; equal tables give equal fingerprints
    pub fn fingerprint(&self) -> String {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (term, count) in entries {
            hasher.update(term.as_bytes());
            hasher.update(b"\t");
            hasher.update(count.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

impl FromIterator<(String, usize)> for TermFrequencyTable {
    /// Build a table from explicit counts. Zero counts are dropped.
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        let counts: HashMap<String, usize> = iter.into_iter().filter(|(_, count)| *count > 0).collect();
        let total_tokens = counts.values().sum();
        Self {
            counts,
            total_tokens,
        }
    }
}
