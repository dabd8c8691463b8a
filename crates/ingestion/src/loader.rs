//! Corpus loader
//!
//! Fetches both knowledge sources, extracts their text and assembles the
//! search corpus. Any failure aborts the whole load; there is no partial
//! corpus and no retry.

use crate::corpus::build_corpus;
use crate::errors::IngestionError;
use crate::knowledge::load_structured_knowledge;
use crate::pdf::extract_document_text;
use crate::source::{fetch_source, SourceLocation};
use sitechat_common::config::SourcesConfig;
use std::time::Duration;
use tracing::{info, instrument};

/// Loads the search corpus from a document source and a knowledge source
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    client: reqwest::Client,
    document: SourceLocation,
    knowledge: SourceLocation,
}

impl CorpusLoader {
    pub fn new(
        document: SourceLocation,
        knowledge: SourceLocation,
        fetch_timeout: Duration,
    ) -> Result<Self, IngestionError> {
        let client = reqwest::Client::builder().timeout(fetch_timeout).build()?;

        Ok(Self {
            client,
            document,
            knowledge,
        })
    }

    pub fn from_config(config: &SourcesConfig) -> Result<Self, IngestionError> {
        Self::new(
            SourceLocation::parse(&config.document),
            SourceLocation::parse(&config.knowledge),
            config.fetch_timeout(),
        )
    }

    pub fn document(&self) -> &SourceLocation {
        &self.document
    }

    pub fn knowledge(&self) -> &SourceLocation {
        &self.knowledge
    }

    /// Fetch, extract and concatenate both sources
    #[instrument(skip(self), fields(document = %self.document, knowledge = %self.knowledge))]
    pub async fn load(&self) -> Result<String, IngestionError> {
        let (document_bytes, knowledge_bytes) = tokio::try_join!(
            fetch_source(&self.client, &self.document),
            fetch_source(&self.client, &self.knowledge),
        )?;

        // PDF parsing is CPU bound
        let document_text =
            tokio::task::spawn_blocking(move || extract_document_text(&document_bytes))
                .await
                .map_err(|e| IngestionError::DocumentParse {
                    message: format!("PDF extraction task failed: {}", e),
                })??;

        let knowledge_text = load_structured_knowledge(&knowledge_bytes)?;

        let corpus = build_corpus(&document_text, &knowledge_text);

        info!(
            document_chars = document_text.len(),
            knowledge_chars = knowledge_text.len(),
            corpus_chars = corpus.len(),
            "Corpus loaded"
        );

        Ok(corpus)
    }
}
