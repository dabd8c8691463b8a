//! Knowledge base loading
//!
//! The knowledge base is a JSON object whose values are arrays of strings,
//! e.g. `{"services": ["Transmission EPC", "Substations"], "faq": [...]}`.
//! Nested arrays are flattened; any other shape is rejected.

use crate::errors::IngestionError;
use serde_json::Value;
use tracing::debug;

/// Flatten every string of the knowledge base into newline-separated text.
///
/// Keys are visited in file order and strings in array order.
pub fn load_structured_knowledge(bytes: &[u8]) -> Result<String, IngestionError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| IngestionError::KnowledgeParse {
        message: format!("Invalid JSON: {}", e),
    })?;

    let sections = match value {
        Value::Object(sections) => sections,
        other => {
            return Err(IngestionError::KnowledgeParse {
                message: format!("Expected a JSON object at top level, found {}", kind(&other)),
            })
        }
    };

    let mut entries = Vec::new();
    for (key, section) in &sections {
        match section {
            Value::Array(items) => flatten_strings(key, items, &mut entries)?,
            other => {
                return Err(IngestionError::KnowledgeParse {
                    message: format!("Section '{}' must be an array, found {}", key, kind(other)),
                })
            }
        }
    }

    debug!(
        sections = sections.len(),
        entries = entries.len(),
        "Knowledge base flattened"
    );

    Ok(entries.join("\n"))
}

fn flatten_strings<'a>(
    key: &str,
    items: &'a [Value],
    out: &mut Vec<&'a str>,
) -> Result<(), IngestionError> {
    for item in items {
        match item {
            Value::String(s) => out.push(s),
            Value::Array(nested) => flatten_strings(key, nested, out)?,
            other => {
                return Err(IngestionError::KnowledgeParse {
                    message: format!(
                        "Section '{}' may only contain strings, found {}",
                        key,
                        kind(other)
                    ),
                })
            }
        }
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
