//! Connection response decoding.
//!
//! Turns `data.<query>.edges[].node` into flat records: node ids are decoded
//! to raw ids and a non-blank `jsonExt` blob is merged into the record.

use serde_json::Value;

use crate::collaborators::ResponseEnvelope;
use crate::error::RegistryError;
use crate::identifier;
use crate::mapping::{Record, EXTENSION_FIELD, GENERIC_ID_FIELD};
use crate::Result;

/// Paging facts of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPage {
    pub total_count: u64,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Read `totalCount` and `pageInfo` of `data.<query_name>`.
pub fn page_info(envelope: &ResponseEnvelope, query_name: &str) -> Result<ConnectionPage> {
    let connection = envelope.root(query_name).ok_or_else(|| {
        RegistryError::MalformedResponse(format!("missing data.{query_name}"))
    })?;
    let total_count = connection
        .get("totalCount")
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            RegistryError::MalformedResponse(format!("missing data.{query_name}.totalCount"))
        })?;
    let page = connection.get("pageInfo");
    let has_next_page = page
        .and_then(|p| p.get("hasNextPage"))
        .and_then(Value::as_bool)
        .ok_or_else(|| {
            RegistryError::MalformedResponse(format!(
                "missing data.{query_name}.pageInfo.hasNextPage"
            ))
        })?;
    let end_cursor = page
        .and_then(|p| p.get("endCursor"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ConnectionPage {
        total_count,
        has_next_page,
        end_cursor,
    })
}

/// Decoded records of one response, consumed once.
#[derive(Debug)]
pub struct Records {
    nodes: std::vec::IntoIter<Value>,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next().map(decode_node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl ExactSizeIterator for Records {}

/// Extract the nodes of `data.<query_name>.edges`. A missing connection or
/// edge list yields no records.
pub fn extract_records(envelope: &ResponseEnvelope, query_name: &str) -> Records {
    let nodes: Vec<Value> = envelope
        .root(query_name)
        .and_then(|connection| connection.get("edges"))
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .map(|edge| edge.get("node").cloned().unwrap_or(Value::Object(Record::new())))
                .collect()
        })
        .unwrap_or_default();
    Records {
        nodes: nodes.into_iter(),
    }
}

fn decode_node(node: Value) -> Result<Record> {
    let mut record = match node {
        Value::Object(record) => record,
        other => {
            return Err(RegistryError::MalformedResponse(format!(
                "edge node is not an object: {other}"
            )))
        }
    };

    if let Some(id) = record.get(GENERIC_ID_FIELD).filter(|id| !id.is_null()) {
        let decoded = identifier::decode_value(id)?;
        record.insert(GENERIC_ID_FIELD.to_string(), decoded);
    }

    if let Some(blob) = record.shift_remove(EXTENSION_FIELD) {
        for (key, value) in parse_extension(blob)? {
            record.insert(key, value);
        }
    }
    Ok(record)
}

/// Blank or null blobs carry no fields.
fn parse_extension(blob: Value) -> Result<Record> {
    match blob {
        Value::Null => Ok(Record::new()),
        Value::String(text) if text.trim().is_empty() => Ok(Record::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text)? {
            Value::Object(fields) => Ok(fields),
            other => Err(RegistryError::MalformedResponse(format!(
                "{EXTENSION_FIELD} is not a JSON object: {other}"
            ))),
        },
        Value::Object(fields) => Ok(fields),
        other => Err(RegistryError::MalformedResponse(format!(
            "{EXTENSION_FIELD} is not a JSON object: {other}"
        ))),
    }
}
