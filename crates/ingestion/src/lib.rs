//! SiteChat Ingestion
//!
//! Turns the two knowledge sources into one search corpus:
//! 1. Fetches the company profile PDF and the knowledge base JSON
//! 2. Extracts plain text from each
//! 3. Concatenates them into a single corpus

pub mod corpus;
pub mod errors;
pub mod knowledge;
pub mod loader;
pub mod pdf;
pub mod source;

pub use corpus::build_corpus;
pub use errors::IngestionError;
pub use knowledge::load_structured_knowledge;
pub use loader::CorpusLoader;
pub use pdf::extract_document_text;
pub use source::{fetch_source, SourceLocation};

#[cfg(test)]
mod test_support;
