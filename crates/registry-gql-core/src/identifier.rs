//! Dual-form identifiers.
//!
//! The backend exposes node ids as base64 envelopes of `"<typeTag>:<rawId>"`,
//! while callers may also address records by a plain numeric id. Both forms
//! are modelled by [`Identifier`] and parsed in one place.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use crate::arguments::quote;
use crate::error::RegistryError;
use crate::Result;

/// Identifier as accepted in outgoing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// Opaque string, usually an encoded node id or a uuid
    Opaque(String),
    /// Raw integer primary key
    Numeric(u64),
}

impl Identifier {
    /// Classify a textual id. Only non-empty all-digit strings that fit in a
    /// `u64` are numeric.
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<u64>() {
                return Identifier::Numeric(n);
            }
        }
        Identifier::Opaque(raw.to_string())
    }

    /// Classify a JSON value. Returns `None` for values that are neither
    /// strings nor non-negative integers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::parse(s)),
            Value::Number(n) => n.as_u64().map(Identifier::Numeric),
            _ => None,
        }
    }

    /// Render as a GraphQL argument literal: numbers bare, anything else quoted.
    pub fn render(&self) -> String {
        match self {
            Identifier::Numeric(n) => n.to_string(),
            Identifier::Opaque(s) => quote(s),
        }
    }
}

/// A decoded node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeId {
    pub type_tag: String,
    pub raw_id: String,
}

/// Encode `type_tag:raw_id` into the backend's opaque node id form.
pub fn encode(type_tag: &str, raw_id: &str) -> String {
    STANDARD.encode(format!("{type_tag}:{raw_id}"))
}

/// Decode an opaque node id. Splits on the first colon of the decoded text.
pub fn decode(encoded: &str) -> Result<NodeId> {
    let invalid = |reason: String| RegistryError::InvalidIdentifier {
        value: encoded.to_string(),
        reason,
    };
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| invalid(format!("not base64: {e}")))?;
    let text = String::from_utf8(bytes).map_err(|e| invalid(format!("not utf-8: {e}")))?;
    let (type_tag, raw_id) = text
        .split_once(':')
        .ok_or_else(|| invalid("missing `:` separator".to_string()))?;
    Ok(NodeId {
        type_tag: type_tag.to_string(),
        raw_id: raw_id.to_string(),
    })
}

/// Decode an id value found in a response record.
///
/// Numeric ids, in either JSON or textual form, are returned unchanged; opaque
/// strings are replaced by their raw id.
pub fn decode_value(value: &Value) -> Result<Value> {
    match Identifier::from_value(value) {
        Some(Identifier::Numeric(_)) => Ok(value.clone()),
        Some(Identifier::Opaque(encoded)) => Ok(Value::String(decode(&encoded)?.raw_id)),
        None => Err(RegistryError::InvalidIdentifier {
            value: value.to_string(),
            reason: "expected a string or an unsigned integer".to_string(),
        }),
    }
}
