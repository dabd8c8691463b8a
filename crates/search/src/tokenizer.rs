//! Whitespace tokenizer shared by indexing and querying

/// Lowercase `text` and split it on runs of whitespace.
///
/// Punctuation is kept and nothing is stemmed: `"Lines,"` becomes `"lines,"`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_split() {
        assert_eq!(
            tokenize("  Tell me\tabout\n\nTRANSMISSION  "),
            vec!["tell", "me", "about", "transmission"]
        );
    }

    #[test]
    fn test_punctuation_is_kept() {
        assert_eq!(tokenize("400kV, networks."), vec!["400kv,", "networks."]);
    }

    #[test]
    fn test_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \n\t ").is_empty());
    }
}
