//! Serialized editor documents.
//!
//! Content bodies are stored as the editor's JSON document tree encoded to bytes.

use crate::error::{Result, StoreError};
use serde_json::Value;

const INITIAL_CONTENT: &str = include_str!("../assets/initial-content.json");

/// The document seeded into the starter content piece.
pub fn initial_document() -> Result<Value> {
    Ok(serde_json::from_str(INITIAL_CONTENT)?)
}

/// Encode a document tree for storage. The root node must be a `doc`.
pub fn encode_document(doc: &Value) -> Result<Vec<u8>> {
    if doc.get("type").and_then(Value::as_str) != Some("doc") {
        return Err(StoreError::InvalidInput(
            "document root must have type \"doc\"".to_string(),
        ));
    }

    Ok(serde_json::to_vec(doc)?)
}

pub fn decode_document(bytes: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(bytes)?)
}
