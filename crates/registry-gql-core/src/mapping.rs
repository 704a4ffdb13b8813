//! Field mapping between the registry vocabulary and the backend schema.
//!
//! Every field of a registry request falls into exactly one class:
//! - mapped: renamed to a backend field through `fields_mapping`
//! - special: no backend slot, carried inside the `jsonExt` extension blob
//! - meta: passed through untouched (bulk ids such as `uuids`)
//!
//! Anything else is rejected before a document is ever built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::json_text::to_spaced_string;
use crate::obs;
use crate::Result;

/// Flat record: field name to JSON value, in insertion order.
pub type Record = Map<String, Value>;

/// Backend field holding the JSON object of special-field values.
pub const EXTENSION_FIELD: &str = "jsonExt";

/// Generic identifier key used by registry requests.
pub const GENERIC_ID_FIELD: &str = "id";

fn default_meta_fields() -> Vec<String> {
    vec!["uuid".to_string(), "uuids".to_string()]
}

fn default_id_field() -> String {
    GENERIC_ID_FIELD.to_string()
}

/// Which class a registry field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass<'a> {
    Mapped(&'a str),
    Special,
    Meta,
}

/// Mapping configuration for one registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMappingSpec {
    /// Registry field name to backend field name
    pub fields_mapping: IndexMap<String, String>,
    /// Registry fields stored only in the extension blob
    #[serde(default)]
    pub special_fields: Vec<String>,
    /// Registry fields passed through unchanged
    #[serde(default = "default_meta_fields")]
    pub meta_fields: Vec<String>,
    /// Values the backend requires but the registry does not carry
    #[serde(default)]
    pub default_values: IndexMap<String, Value>,
    /// Backend field that receives the generic `id` when it differs from it
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl FieldMappingSpec {
    pub fn new<I, K, V>(fields_mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields_mapping: fields_mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            special_fields: Vec::new(),
            meta_fields: default_meta_fields(),
            default_values: IndexMap::new(),
            id_field: default_id_field(),
        }
    }

    pub fn with_special_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_meta_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.default_values.insert(field.into(), value);
        self
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Check the configuration itself: mapped targets must be unique and must
    /// not collide with the extension blob field.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for (external, internal) in &self.fields_mapping {
            if internal == EXTENSION_FIELD {
                return Err(RegistryError::Config(format!(
                    "field `{external}` cannot map onto the extension field `{EXTENSION_FIELD}`"
                )));
            }
            if !seen.insert(internal.as_str()) {
                return Err(RegistryError::Config(format!(
                    "backend field `{internal}` is mapped more than once"
                )));
            }
        }
        Ok(())
    }

    /// Classify a registry field name. Mapped wins over special, special over meta.
    pub fn classify(&self, field: &str) -> Option<FieldClass<'_>> {
        if let Some(internal) = self.fields_mapping.get(field) {
            Some(FieldClass::Mapped(internal.as_str()))
        } else if self.special_fields.iter().any(|f| f == field) {
            Some(FieldClass::Special)
        } else if self.meta_fields.iter().any(|f| f == field) {
            Some(FieldClass::Meta)
        } else {
            None
        }
    }

    /// Translate a registry record into backend field names.
    ///
    /// Special fields are collected into a JSON object and attached as the
    /// `jsonExt` string. An unclassified generic `id` is passed through as is.
    /// Fails on the first other unclassified field without producing a
    /// partial result.
    pub fn to_query_representation(&self, record: &Record) -> Result<Record> {
        let mut mapped = Record::new();
        let mut extension = Record::new();

        for (field, value) in record {
            match self.classify(field) {
                Some(FieldClass::Mapped(internal)) => {
                    mapped.insert(internal.to_string(), value.clone());
                }
                Some(FieldClass::Special) => {
                    extension.insert(field.clone(), value.clone());
                }
                Some(FieldClass::Meta) => {
                    mapped.insert(field.clone(), value.clone());
                }
                // Generic ids always pass through, mapped or not.
                None if field == GENERIC_ID_FIELD => {
                    mapped.insert(field.clone(), value.clone());
                }
                None => {
                    obs::emit_mapping_rejected(field);
                    return Err(RegistryError::Mapping {
                        field: field.clone(),
                        allowed_fields: self.fields_mapping.keys().cloned().collect(),
                        special_fields: self.special_fields.clone(),
                    });
                }
            }
        }

        if !extension.is_empty() {
            let blob = to_spaced_string(&extension)?;
            mapped.insert(EXTENSION_FIELD.to_string(), Value::String(blob));
        }
        Ok(mapped)
    }

    /// Translate backend records back into registry field names, keeping order.
    ///
    /// Meta fields are dropped; special fields (already merged out of the
    /// extension blob by the decoder) are copied verbatim.
    pub fn to_external_representation<I>(&self, records: I) -> Vec<Record>
    where
        I: IntoIterator<Item = Record>,
    {
        let reversed: IndexMap<&str, &str> = self
            .fields_mapping
            .iter()
            .map(|(external, internal)| (internal.as_str(), external.as_str()))
            .collect();

        records
            .into_iter()
            .map(|record| {
                let mut entry = Record::new();
                for (key, value) in record {
                    if self.meta_fields.contains(&key) {
                        continue;
                    }
                    if let Some(external) = reversed.get(key.as_str()) {
                        entry.insert(external.to_string(), value.clone());
                    }
                    if self.special_fields.contains(&key) {
                        entry.insert(key, value);
                    }
                }
                entry
            })
            .collect()
    }

    /// Default arguments for a mutation over `mapped`.
    ///
    /// Starts from `default_values`, drops every field `mapped` already sets,
    /// and, when the configured `id_field` is missing but a generic `id` is
    /// present, adds `id_field` with that id. Values stay raw; they are
    /// rendered by the same serializer as regular arguments.
    pub fn fill_defaults(&self, mapped: &Record) -> Record {
        let mut defaults: Record = self
            .default_values
            .iter()
            .filter(|(field, _)| !mapped.contains_key(field.as_str()))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        let id_field_known = mapped.contains_key(&self.id_field)
            || self.default_values.contains_key(&self.id_field);
        if !id_field_known {
            if let Some(id) = mapped.get(GENERIC_ID_FIELD) {
                defaults.insert(self.id_field.clone(), id.clone());
            }
        }
        defaults
    }
}
