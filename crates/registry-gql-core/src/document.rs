//! Query and mutation document building.
//!
//! Two document shapes are the wire contract with the backend:
//! - a connection query returning `totalCount`, `pageInfo { hasNextPage, endCursor }`
//!   and `edges { cursor node { .. } }`
//! - a mutation whose `input` carries `clientMutationId`, `clientMutationLabel`,
//!   the field arguments and the default arguments, returning
//!   `clientMutationId` and `internalId`
//!
//! The template functions are pure; [`DocumentBuilder`] only adds the field
//! mapping of one registry on top of them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arguments::{quote, render_argument, render_arguments};
use crate::collaborators::ClientMutationId;
use crate::error::RegistryError;
use crate::mapping::{FieldClass, FieldMappingSpec, Record, EXTENSION_FIELD, GENERIC_ID_FIELD};
use crate::Result;

/// Label stamped on every mutation this crate submits.
pub const DEFAULT_MUTATION_LABEL: &str = "GovStack Digital Registry BB Action";

/// Default `first` for record lookups.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    Ascending,
    Descending,
}

impl Ordering {
    fn order_key(self, field: &str) -> String {
        match self {
            Ordering::Ascending => quote(field),
            Ordering::Descending => quote(&format!("-{field}")),
        }
    }
}

impl FromStr for Ordering {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ascending" => Ok(Ordering::Ascending),
            "descending" => Ok(Ordering::Descending),
            other => Err(RegistryError::InvalidOrdering {
                value: other.to_string(),
            }),
        }
    }
}

/// Parameters of a paginated, filtered listing.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub query_name: String,
    /// Registry-side filter fields
    pub filters: Record,
    pub ordering: Option<Ordering>,
    /// Zero-based page index
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl ListQuery {
    /// Unfiltered, unordered listing of `query_name`.
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            ..Default::default()
        }
    }

    /// Set the registry-side filters.
    pub fn with_filters(mut self, filters: Record) -> Self {
        self.filters = filters;
        self
    }

    /// Order by the first mapped filter field.
    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Select the zero-based `page` of `page_size` records.
    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

/// Parameters of a record lookup.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub query_name: String,
    /// Registry-side filter fields
    pub filters: Record,
    /// Forward cursor; replaces every other argument when set
    pub after_cursor: Option<String>,
    /// Explicit backend projection; defaults to every mapped field plus `jsonExt`
    pub fetched_fields: Option<Vec<String>>,
    pub first: Option<u64>,
    /// Return only the first decoded record instead of the whole page
    pub only_first: bool,
    /// Return backend field names instead of registry field names
    pub skip_mapping: bool,
}

impl RecordQuery {
    /// First record of `query_name`, mapped, fetched with the default projection.
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            filters: Record::new(),
            after_cursor: None,
            fetched_fields: None,
            first: Some(DEFAULT_PAGE_SIZE),
            only_first: true,
            skip_mapping: false,
        }
    }

    /// Set the registry-side filters.
    pub fn with_filters(mut self, filters: Record) -> Self {
        self.filters = filters;
        self
    }

    /// Continue after `cursor`, ignoring filters and `first`.
    pub fn with_after_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.after_cursor = Some(cursor.into());
        self
    }

    /// Project these backend fields instead of the default set.
    pub fn with_fetched_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetched_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Page size sent as `first`; `None` omits it.
    pub fn with_first(mut self, first: Option<u64>) -> Self {
        self.first = first;
        self
    }

    /// Return every decoded record, not only the first.
    pub fn all_records(mut self) -> Self {
        self.only_first = false;
        self
    }

    /// Keep backend field names.
    pub fn raw(mut self) -> Self {
        self.skip_mapping = true;
        self
    }
}

/// A rendered mutation and the correlation id embedded in it.
#[derive(Debug, Clone)]
pub struct MutationDocument {
    pub client_mutation_id: ClientMutationId,
    pub text: String,
}

/// Render a connection query.
pub fn connection_query(query_name: &str, arguments: &str, fetched_fields: &str) -> String {
    let call = if arguments.trim().is_empty() {
        query_name.to_string()
    } else {
        format!("{query_name}({arguments})")
    };
    format!(
        "query {{
    {call} {{
        totalCount
        pageInfo {{ hasNextPage, endCursor }}
        edges {{
            cursor
            node {{
                {fetched_fields}
            }}
        }}
    }}
}}
"
    )
}

/// Render a mutation document.
pub fn mutation_document(
    mutation_name: &str,
    client_mutation_id: &ClientMutationId,
    label: &str,
    arguments: &str,
    default_arguments: &str,
) -> String {
    let mut input = vec![
        format!("clientMutationId: {}", quote(client_mutation_id.as_str())),
        format!("clientMutationLabel: {}", quote(label)),
    ];
    input.extend(
        [arguments, default_arguments]
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(str::to_string),
    );
    let input = input.join("\n            ");
    format!(
        "mutation {{
    {mutation_name}(
        input: {{
            {input}
        }}
    ) {{
        clientMutationId
        internalId
    }}
}}
"
    )
}

/// Builds documents for one registry's field mapping.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    spec: FieldMappingSpec,
    mutation_label: String,
}

impl DocumentBuilder {
    pub fn new(spec: FieldMappingSpec) -> Self {
        Self {
            spec,
            mutation_label: DEFAULT_MUTATION_LABEL.to_string(),
        }
    }

    pub fn with_mutation_label(mut self, label: impl Into<String>) -> Self {
        self.mutation_label = label.into();
        self
    }

    pub fn spec(&self) -> &FieldMappingSpec {
        &self.spec
    }

    /// Build a paginated listing query.
    pub fn build_list_query(&self, query: &ListQuery) -> Result<String> {
        let mut mapped = self.spec.to_query_representation(&query.filters)?;

        // Extension content cannot be projected field by field.
        let mut fetched: Vec<&str> = self.spec.fields_mapping.values().map(String::as_str).collect();
        fetched.push(EXTENSION_FIELD);
        mapped.shift_remove(EXTENSION_FIELD);

        let mut parts = vec![render_arguments(&mapped)?];
        if let Some(page_size) = query.page_size.filter(|size| *size > 0) {
            parts.push(format!("first:{page_size}"));
        }
        if let (Some(page), Some(page_size)) = (query.page.filter(|p| *p > 0), query.page_size) {
            let offset = page
                .checked_mul(page_size)
                .ok_or(RegistryError::InvalidPage { page, page_size })?;
            parts.push(format!("offset: {offset}"));
        }
        if let (Some(ordering), Some(sort_field)) = (query.ordering, self.sort_field(&query.filters))
        {
            parts.push(format!("orderBy: [{}]", ordering.order_key(sort_field)));
        }

        let arguments = join_parts(parts);
        Ok(connection_query(&query.query_name, &arguments, &fetched.join(" ")))
    }

    /// Build a record lookup query.
    pub fn build_record_query(&self, query: &RecordQuery) -> Result<String> {
        let mut mapped = self.spec.to_query_representation(&query.filters)?;
        let id_field = self.spec.id_field.as_str();
        if id_field != GENERIC_ID_FIELD && !mapped.contains_key(id_field) {
            if let Some(id) = mapped.shift_remove(GENERIC_ID_FIELD) {
                mapped.insert(id_field.to_string(), id);
            }
        }

        let fetched = match &query.fetched_fields {
            Some(fields) if !fields.is_empty() => fields.join(", "),
            _ => self.default_projection(),
        };
        mapped.shift_remove(EXTENSION_FIELD);

        let arguments = match query.after_cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(cursor) => format!("after: {}", quote(cursor)),
            None => {
                let mut parts = vec![render_arguments(&mapped)?];
                if let Some(first) = query.first.filter(|n| *n > 0) {
                    parts.push(format!("first:{first}"));
                }
                join_parts(parts)
            }
        };
        Ok(connection_query(&query.query_name, &arguments, &fetched))
    }

    /// Build a mutation carrying a freshly generated correlation id.
    pub fn build_mutation(
        &self,
        record: &Record,
        mutation_name: &str,
        use_defaults: bool,
    ) -> Result<MutationDocument> {
        let mapped = self.spec.to_query_representation(record)?;
        let defaults = if use_defaults {
            self.spec.fill_defaults(&mapped)
        } else {
            Record::new()
        };

        let arguments = render_arguments(&mapped)?;
        let default_arguments = defaults
            .iter()
            .map(|(field, value)| render_argument(field, value))
            .collect::<Result<Vec<_>>>()?
            .join(" ");

        let client_mutation_id = ClientMutationId::new();
        let text = mutation_document(
            mutation_name,
            &client_mutation_id,
            &self.mutation_label,
            &arguments,
            &default_arguments,
        );
        Ok(MutationDocument {
            client_mutation_id,
            text,
        })
    }

    /// Backend name of the first mapped filter field. Meta and special
    /// fields never drive ordering.
    fn sort_field<'a>(&'a self, filters: &Record) -> Option<&'a str> {
        filters.keys().find_map(|field| match self.spec.classify(field) {
            Some(FieldClass::Mapped(internal)) => Some(internal),
            _ => None,
        })
    }

    fn default_projection(&self) -> String {
        let mut fields: Vec<&str> = self
            .spec
            .fields_mapping
            .iter()
            .filter(|(external, _)| !self.spec.meta_fields.contains(external))
            .map(|(_, internal)| internal.as_str())
            .collect();
        fields.push(EXTENSION_FIELD);
        fields.join(" ")
    }
}

fn join_parts(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(
            FieldMappingSpec::new([("name", "firstName"), ("surname", "lastName"), ("id", "id")])
                .with_special_fields(["note"]),
        )
    }

    /// Text between the first `(` after the query name and its matching `)`.
    fn arguments_of(document: &str) -> String {
        let start = document.find('(').map(|i| i + 1).unwrap_or(0);
        let end = document.find(") {").unwrap_or(start);
        document[start..end].to_string()
    }

    #[test]
    fn list_query_paginates() {
        let query = ListQuery::new("persons")
            .with_filters(filters(json!({"name": "Jo"})))
            .with_page(2, 10);
        let document = builder().build_list_query(&query).unwrap();
        let arguments = arguments_of(&document);

        assert!(arguments.contains("offset: 20"), "{arguments}");
        assert!(arguments.contains("first:10"), "{arguments}");
        assert!(arguments.contains(r#"firstName: "Jo""#), "{arguments}");
    }

    #[test]
    fn list_query_rejects_overflowing_offset() {
        let query = ListQuery::new("persons").with_page(u64::MAX / 2, 10);
        let err = builder().build_list_query(&query).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidPage { page_size: 10, .. }
        ));
    }

    #[test]
    fn list_query_orders_by_first_mapped_field() {
        let base = ListQuery::new("persons").with_filters(filters(json!({"name": "Jo"})));

        let descending = builder()
            .build_list_query(&base.clone().with_ordering(Ordering::Descending))
            .unwrap();
        assert!(descending.contains(r#"orderBy: ["-firstName"]"#));

        let ascending = builder()
            .build_list_query(&base.with_ordering(Ordering::Ascending))
            .unwrap();
        assert!(ascending.contains(r#"orderBy: ["firstName"]"#));
    }

    #[test]
    fn list_query_without_filters_has_no_ordering() {
        let query = ListQuery::new("persons").with_ordering(Ordering::Descending);
        let document = builder().build_list_query(&query).unwrap();
        assert!(!document.contains("orderBy"));
        assert!(document.contains("    persons {"));
    }

    #[test]
    fn ordering_ignores_special_and_meta_fields() {
        let query = ListQuery::new("persons")
            .with_filters(filters(json!({"uuid": "u-1", "note": "x", "surname": "Doe"})))
            .with_ordering(Ordering::Ascending);
        let document = builder().build_list_query(&query).unwrap();
        assert!(document.contains(r#"orderBy: ["lastName"]"#));
    }

    #[test]
    fn list_query_always_fetches_extension_but_never_filters_on_it() {
        let query = ListQuery::new("persons").with_filters(filters(json!({"note": "x"})));
        let document = builder().build_list_query(&query).unwrap();
        assert!(document.contains("firstName lastName id jsonExt"));
        assert!(!arguments_of(&document).contains("jsonExt"));
    }

    #[test]
    fn list_query_rejects_unknown_fields() {
        let query = ListQuery::new("persons").with_filters(filters(json!({"shoe": 1})));
        assert!(matches!(
            builder().build_list_query(&query),
            Err(RegistryError::Mapping { .. })
        ));
    }

    #[test]
    fn connection_shape_is_exact() {
        let document = connection_query("persons", r#"firstName: "Jo""#, "firstName jsonExt");
        let compact: String = document.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(
            compact,
            r#"query { persons(firstName: "Jo") { totalCount pageInfo { hasNextPage, endCursor } edges { cursor node { firstName jsonExt } } } }"#
        );
    }

    #[test]
    fn record_query_renames_generic_id() {
        let builder = DocumentBuilder::new(
            FieldMappingSpec::new([("name", "firstName")])
                .with_meta_fields(["uuid", "uuids", "id"])
                .with_id_field("uuid"),
        );
        let query = RecordQuery::new("persons").with_filters(filters(json!({"id": "abc"})));
        let document = builder.build_record_query(&query).unwrap();
        assert_eq!(arguments_of(&document), r#"uuid: "abc" first:10"#);
    }

    #[test]
    fn record_query_default_projection_skips_meta_fields() {
        let builder = DocumentBuilder::new(FieldMappingSpec::new([
            ("name", "firstName"),
            ("uuid", "uuid"),
        ]));
        let document = builder.build_record_query(&RecordQuery::new("persons")).unwrap();
        assert!(document.contains("firstName jsonExt"));
        assert!(!document.contains("uuid"));
        assert!(document.contains("persons(first:10)"));
    }

    #[test]
    fn record_query_joins_explicit_fields() {
        let query = RecordQuery::new("persons").with_fetched_fields(["id", "firstName"]);
        let document = builder().build_record_query(&query).unwrap();
        assert!(document.contains("id, firstName"));
    }

    #[test]
    fn cursor_replaces_all_arguments() {
        let query = RecordQuery::new("persons")
            .with_filters(filters(json!({"name": "Jo"})))
            .with_after_cursor("YXJyYXljb25uZWN0aW9uOjk=");
        let document = builder().build_record_query(&query).unwrap();
        assert_eq!(arguments_of(&document), r#"after: "YXJyYXljb25uZWN0aW9uOjk=""#);
    }

    #[test]
    fn mutation_carries_correlation_id_label_and_arguments() {
        let record = filters(json!({"name": "Jo", "note": "hi", "id": "5"}));
        let mutation = builder().build_mutation(&record, "createPerson", false).unwrap();
        let text = &mutation.text;

        assert!(text.contains(&format!(
            "clientMutationId: \"{}\"",
            mutation.client_mutation_id
        )));
        assert!(text.contains(r#"clientMutationLabel: "GovStack Digital Registry BB Action""#));
        assert!(text.contains(r#"firstName: "Jo""#));
        assert!(text.contains(r#"jsonExt: "{\"note\": \"hi\"}""#));
        assert!(text.contains("id: 5"));
        assert!(text.contains("createPerson("));
        let compact: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(compact.ends_with(") { clientMutationId internalId } }"));
    }

    #[test]
    fn mutation_defaults_use_argument_rules() {
        let builder = DocumentBuilder::new(
            FieldMappingSpec::new([("name", "firstName"), ("id", "id")])
                .with_id_field("uuid")
                .with_default_value("genderId", json!("M"))
                .with_default_value("tags", json!(["a"])),
        )
        .with_mutation_label("Custom label");
        let record = filters(json!({"name": "Jo", "id": "7"}));

        let with_defaults = builder.build_mutation(&record, "updatePerson", true).unwrap();
        assert!(with_defaults.text.contains(r#"genderId: "M""#));
        assert!(with_defaults.text.contains(r#"tags: ["a"]"#));
        assert!(with_defaults.text.contains(r#"uuid: "7""#));
        assert!(with_defaults.text.contains(r#"clientMutationLabel: "Custom label""#));

        let without = builder.build_mutation(&record, "updatePerson", false).unwrap();
        assert!(!without.text.contains("genderId"));
        assert!(!without.text.contains("uuid:"));
    }

    #[test]
    fn each_mutation_gets_a_new_correlation_id() {
        let record = filters(json!({"name": "Jo"}));
        let a = builder().build_mutation(&record, "createPerson", false).unwrap();
        let b = builder().build_mutation(&record, "createPerson", false).unwrap();
        assert_ne!(a.client_mutation_id, b.client_mutation_id);
    }

    #[test]
    fn ordering_parses_known_keywords_only() {
        assert_eq!("ascending".parse::<Ordering>().unwrap(), Ordering::Ascending);
        assert_eq!("descending".parse::<Ordering>().unwrap(), Ordering::Descending);
        assert!(matches!(
            "sideways".parse::<Ordering>(),
            Err(RegistryError::InvalidOrdering { .. })
        ));
    }
}
