//! Registry definitions loaded from configuration.
//!
//! A definitions file is a JSON array; each entry names the backend query and
//! mutations of one registry version together with its field mapping:
//!
//! ```json
//! [{
//!   "name": "persons", "version": "1.0",
//!   "queryName": "persons",
//!   "createMutation": "createPerson", "updateMutation": "updatePerson",
//!   "deleteMutation": "deletePersons",
//!   "fieldsMapping": {"name": "firstName", "id": "id"},
//!   "specialFields": ["note"],
//!   "defaultValues": {"genderId": "M"}
//! }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::mapping::FieldMappingSpec;
use crate::Result;

/// One registry version and how it maps onto the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDefinition {
    pub name: String,
    pub version: String,
    pub query_name: String,
    pub create_mutation: String,
    pub update_mutation: String,
    #[serde(default)]
    pub delete_mutation: Option<String>,
    #[serde(flatten)]
    pub mapping: FieldMappingSpec,
}

/// Every registry definition known to a deployment.
#[derive(Debug, Clone, Default)]
pub struct RegistryCatalog {
    definitions: Vec<RegistryDefinition>,
}

impl RegistryCatalog {
    /// Build a catalog, rejecting invalid mappings and duplicate `(name, version)` keys.
    pub fn new(definitions: Vec<RegistryDefinition>) -> Result<Self> {
        for (i, definition) in definitions.iter().enumerate() {
            definition.mapping.validate().map_err(|e| {
                RegistryError::Config(format!(
                    "registry {}/{}: {e}",
                    definition.name, definition.version
                ))
            })?;
            let duplicate = definitions[..i]
                .iter()
                .any(|d| d.name == definition.name && d.version == definition.version);
            if duplicate {
                return Err(RegistryError::Config(format!(
                    "registry {}/{} is defined more than once",
                    definition.name, definition.version
                )));
            }
        }
        Ok(Self { definitions })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let definitions: Vec<RegistryDefinition> = serde_json::from_str(text)?;
        Self::new(definitions)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Look up a registry. Without a version, the last definition with that
    /// name wins.
    pub fn get(&self, name: &str, version: Option<&str>) -> Result<&RegistryDefinition> {
        self.definitions
            .iter()
            .rev()
            .find(|d| d.name == name && version.map_or(true, |v| d.version == v))
            .ok_or_else(|| {
                RegistryError::Config(format!(
                    "unknown registry {name}{}",
                    version.map(|v| format!("/{v}")).unwrap_or_default()
                ))
            })
    }

    pub fn definitions(&self) -> &[RegistryDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
