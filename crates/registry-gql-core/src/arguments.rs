//! GraphQL argument rendering.
//!
//! One routine renders every `field: value` pair, whether it ends up in a list
//! query, a record query, a mutation input, or a default argument.

use serde_json::Value;

use crate::identifier::Identifier;
use crate::json_text::to_spaced_string;
use crate::mapping::{Record, EXTENSION_FIELD, GENERIC_ID_FIELD};
use crate::Result;

/// Quote `text` as a GraphQL string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a single value for `field`.
///
/// - `jsonExt` strings are quoted with inner quotes escaped
/// - `id` is bare when numeric, quoted otherwise
/// - lists are inline JSON arrays
/// - `null` stays bare; every other scalar is quoted
pub fn render_value(field: &str, value: &Value) -> Result<String> {
    if field == EXTENSION_FIELD {
        if let Value::String(blob) = value {
            return Ok(quote(blob));
        }
    }
    if field == GENERIC_ID_FIELD {
        if let Some(id) = Identifier::from_value(value) {
            return Ok(id.render());
        }
    }
    let rendered = match value {
        Value::Array(_) => to_spaced_string(value)?,
        Value::Null => "null".to_string(),
        Value::String(s) => quote(s),
        Value::Number(n) => quote(&n.to_string()),
        Value::Bool(b) => quote(&b.to_string()),
        Value::Object(_) => quote(&to_spaced_string(value)?),
    };
    Ok(rendered)
}

/// Render `field: value`.
pub fn render_argument(field: &str, value: &Value) -> Result<String> {
    Ok(format!("{field}: {}", render_value(field, value)?))
}

/// Render every pair of `record`, comma separated, in record order.
pub fn render_arguments(record: &Record) -> Result<String> {
    let arguments = record
        .iter()
        .map(|(field, value)| render_argument(field, value))
        .collect::<Result<Vec<_>>>()?;
    Ok(arguments.join(", "))
}
