//! Corpus assembly

/// Concatenate the document text and the knowledge text into one corpus.
///
/// The newline keeps the last word of the document and the first word of
/// the knowledge base apart. No normalization happens here.
pub fn build_corpus(document_text: &str, knowledge_text: &str) -> String {
    let mut corpus = String::with_capacity(document_text.len() + knowledge_text.len() + 1);
    corpus.push_str(document_text);
    corpus.push('\n');
    corpus.push_str(knowledge_text);
    corpus
}
