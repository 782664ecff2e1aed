//! Issue listing decoder

use super::types::FetchedItem;
use crate::error::{Error, Result};
use serde_json::Value;

/// Decoder for the JSON array returned by the issue listing endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueDecoder;

impl IssueDecoder {
    /// Create a new issue decoder
    pub fn new() -> Self {
        Self
    }

    /// Decode a response body into items, preserving response order
    pub fn decode(&self, body: &str) -> Result<Vec<FetchedItem>> {
        let value: Value = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })?;
        self.decode_value(value)
    }

    /// Decode an already-parsed response body
    pub fn decode_value(&self, value: Value) -> Result<Vec<FetchedItem>> {
        match value {
            Value::Array(items) => items.into_iter().map(decode_item).collect(),
            Value::Object(map) => {
                // `{"message": ...}` is the API error shape
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("expected an array of issues");
                Err(Error::decode(format!(
                    "Unexpected object in issue listing: {message}"
                )))
            }
            other => Err(Error::decode(format!(
                "Unexpected {} in issue listing",
                json_kind(&other)
            ))),
        }
    }
}

fn decode_item(value: Value) -> Result<FetchedItem> {
    let id = value.get("id").and_then(Value::as_u64).unwrap_or(0);
    let number = value.get("number").and_then(Value::as_u64).unwrap_or(0);

    serde_json::from_value(value).map_err(|e| Error::malformed(id, number, e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
