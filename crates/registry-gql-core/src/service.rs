//! CRUD surface of one registry definition.
//!
//! [`RegistryService`] binds a [`RegistryDefinition`] to a
//! [`RegistryGqlManager`] so callers name operations instead of backend
//! queries and mutations.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::collaborators::{CorrelationLog, QueryExecutor};
use crate::definition::RegistryDefinition;
use crate::document::{ListQuery, Ordering, RecordQuery};
use crate::error::RegistryError;
use crate::manager::{ActionResult, RegistryGqlManager};
use crate::mapping::{Record, GENERIC_ID_FIELD};
use crate::Result;

/// Meta field carrying the identifiers handed to a delete mutation.
pub const DELETE_IDS_FIELD: &str = "uuids";

#[derive(Clone)]
pub struct RegistryService {
    definition: RegistryDefinition,
    manager: RegistryGqlManager,
}

impl RegistryService {
    pub fn new(
        definition: RegistryDefinition,
        executor: Arc<dyn QueryExecutor>,
        correlation_log: Arc<dyn CorrelationLog>,
    ) -> Self {
        let manager = RegistryGqlManager::new(executor, correlation_log, definition.mapping.clone());
        Self {
            definition,
            manager,
        }
    }

    pub fn with_mutation_label(mut self, label: impl Into<String>) -> Self {
        self.manager = self.manager.with_mutation_label(label);
        self
    }

    pub fn definition(&self) -> &RegistryDefinition {
        &self.definition
    }

    pub fn manager(&self) -> &RegistryGqlManager {
        &self.manager
    }

    /// One page of records matching `filters`.
    pub async fn list(
        &self,
        filters: Record,
        ordering: Option<Ordering>,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<ActionResult> {
        let mut query = ListQuery::new(&self.definition.query_name).with_filters(filters);
        query.ordering = ordering;
        query.page = page;
        query.page_size = page_size;
        self.manager.retrieve_filtered_records(&query).await
    }

    /// The first record matching `filters`, or an empty list when none does.
    pub async fn get(&self, filters: Record) -> Result<ActionResult> {
        let query = RecordQuery::new(&self.definition.query_name).with_filters(filters);
        self.manager.get_record(&query).await
    }

    pub async fn create(&self, record: &Record) -> Result<ActionResult> {
        self.manager
            .mutate(&self.definition.create_mutation, record, true)
            .await
    }

    /// Update the record identified by `record`'s `id` (or configured id field).
    pub async fn update(&self, record: &Record) -> Result<ActionResult> {
        self.manager
            .mutate(&self.definition.update_mutation, record, true)
            .await
    }

    /// Update the first record matching `query`, or create `write` when
    /// nothing matches.
    ///
    /// `data` is `{"action": "updated"}` or `{"action": "created"}`.
    pub async fn update_or_create(&self, query: Record, write: &Record) -> Result<ActionResult> {
        let lookup = RecordQuery::new(&self.definition.query_name)
            .with_filters(query)
            .with_first(Some(1));
        let existing = self.manager.get_record(&lookup).await?;

        match existing.data {
            Value::Object(found) => {
                let id = found.get(GENERIC_ID_FIELD).cloned().ok_or_else(|| {
                    RegistryError::Config(format!(
                        "registry {} returns records without `{GENERIC_ID_FIELD}`; map it to update records",
                        self.definition.name
                    ))
                })?;
                debug!(registry = %self.definition.name, id = %id, "matching record found");

                let mut update = write.clone();
                update.insert(GENERIC_ID_FIELD.to_string(), id);
                self.update(&update).await?;
                info!(registry = %self.definition.name, "record updated");
                Ok(ActionResult::ok(json!({"action": "updated"})))
            }
            _ => {
                self.create(write).await?;
                info!(registry = %self.definition.name, "record created");
                Ok(ActionResult::ok(json!({"action": "created"})))
            }
        }
    }

    /// Delete records by identifier through the registry's delete mutation.
    pub async fn delete(&self, ids: &[String]) -> Result<ActionResult> {
        let mutation = self.definition.delete_mutation.as_deref().ok_or_else(|| {
            RegistryError::Config(format!(
                "registry {} has no delete mutation configured",
                self.definition.name
            ))
        })?;
        if ids.is_empty() {
            return Err(RegistryError::Config("nothing to delete".to_string()));
        }

        let mut record = Record::new();
        record.insert(DELETE_IDS_FIELD.to_string(), json!(ids));
        self.manager.mutate(mutation, &record, false).await
    }
}
