//! Registry-GQL Core: registry CRUD over a Relay-style GraphQL backend
//!
//! Translates registry records into backend field names, renders connection
//! queries and mutations, decodes connection responses, and resolves mutation
//! outcomes through the backend's mutation log.
//!
//! ## Key Components
//!
//! - `FieldMappingSpec`: mapped, special (`jsonExt`) and meta fields of one registry
//! - `DocumentBuilder`: list, record and mutation documents
//! - `RegistryGqlManager`: one round trip per operation, with mutation correlation
//! - `RegistryService`: CRUD facade over a `RegistryDefinition`
//! - `QueryExecutor` / `CorrelationLog`: the collaborator seams, faked in `fakes`

pub mod arguments;
pub mod collaborators;
pub mod convert;
pub mod decoder;
pub mod definition;
pub mod document;
mod error;
pub mod fakes;
pub mod identifier;
mod json_text;
pub mod manager;
pub mod mapping;
pub mod metrics;
pub mod obs;
pub mod service;
pub mod telemetry;

pub use collaborators::{
    ClientMutationId, CorrelationLog, ExecutorResult, GraphqlError, MutationCorrelation,
    MutationStatus, QueryExecutor, ResponseEnvelope,
};
pub use convert::{convert_output_format, convert_output_format_named, OutputFormat};
pub use decoder::{extract_records, page_info, ConnectionPage};
pub use definition::{RegistryCatalog, RegistryDefinition};
pub use document::{
    DocumentBuilder, ListQuery, MutationDocument, Ordering, RecordQuery, DEFAULT_MUTATION_LABEL,
    DEFAULT_PAGE_SIZE,
};
pub use error::{ConversionError, ExecutorError, MutationFailure, RegistryError};
pub use identifier::{Identifier, NodeId};
pub use manager::{ActionResult, RegistryGqlManager};
pub use mapping::{FieldMappingSpec, Record};
pub use service::RegistryService;
pub use telemetry::init_tracing;

/// Result type for registry-gql operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
