//! Registry-GQL - registry CRUD from the command line
//!
//! The `registry-gql` command runs registry operations against a GraphQL
//! backend, using a definitions file to map registry fields.
//!
//! ## Commands
//!
//! - `list`: One page of records matching `key=value` filters
//! - `get`: First record matching the filters, in json, string or xml form
//! - `create` / `update`: Submit a record and wait for its mutation-log outcome
//! - `upsert`: Update the first match of a query, or create the record
//! - `delete`: Delete records by uuid

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use registry_gql_client::{EndpointConfig, GraphqlHttpClient, GraphqlMutationLog};
use registry_gql_core::{
    convert_output_format, init_tracing, metrics::METRICS, ActionResult, CorrelationLog,
    Ordering, OutputFormat, QueryExecutor, Record, RegistryCatalog, RegistryService,
};
use serde_json::Value;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "registry-gql")]
#[command(version = registry_gql_core::VERSION)]
#[command(about = "Registry CRUD over a GraphQL backend", long_about = None)]
struct Cli {
    /// Registry definitions file (JSON array)
    #[arg(short, long, env = "REGISTRY_GQL_DEFINITIONS", global = true)]
    definitions: Option<PathBuf>,

    /// Registry name
    #[arg(short, long, global = true)]
    registry: Option<String>,

    /// Registry version (latest definition when omitted)
    #[arg(long = "registry-version", global = true)]
    registry_version: Option<String>,

    /// GraphQL endpoint, overriding REGISTRY_GQL_ENDPOINT
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// List records matching filters
    List {
        /// Filters as key=value
        filters: Vec<String>,

        /// ascending or descending, on the first filter field
        #[arg(long)]
        ordering: Option<String>,

        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: u64,

        #[arg(long, default_value = "10")]
        page_size: u64,
    },

    /// Show the first record matching filters
    Get {
        /// Filters as key=value
        filters: Vec<String>,

        /// Output format: json, string or xml
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Create a record
    Create {
        /// Record as a JSON object
        #[arg(long)]
        data: String,
    },

    /// Update a record; the data must carry its id
    Update {
        /// Record as a JSON object
        #[arg(long)]
        data: String,
    },

    /// Update the first record matching a query, or create it
    Upsert {
        /// Lookup filters as a JSON object
        #[arg(long)]
        query: String,

        /// Record as a JSON object
        #[arg(long)]
        data: String,
    },

    /// Delete records by uuid
    Delete {
        #[arg(required = true)]
        uuids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let service = connect(&cli)?;
    let result = run(&service, cli.command).await;
    METRICS.flush();

    let result = result?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Bind the selected registry definition to the HTTP collaborators.
fn connect(cli: &Cli) -> Result<RegistryService> {
    let definitions = cli
        .definitions
        .as_ref()
        .context("no definitions file given (use --definitions or REGISTRY_GQL_DEFINITIONS)")?;
    let registry = cli.registry.as_deref().context("no registry given (use --registry)")?;

    let catalog = RegistryCatalog::from_path(definitions)
        .with_context(|| format!("Failed to load definitions from {}", definitions.display()))?;
    let definition = catalog
        .get(registry, cli.registry_version.as_deref())?
        .clone();
    debug!(registry = %definition.name, version = %definition.version, "registry selected");

    let mut config = EndpointConfig::from_env();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    let executor: Arc<dyn QueryExecutor> =
        Arc::new(GraphqlHttpClient::new(config).context("Failed to create GraphQL client")?);
    let log: Arc<dyn CorrelationLog> = Arc::new(GraphqlMutationLog::new(executor.clone()));

    Ok(RegistryService::new(definition, executor, log))
}

async fn run(service: &RegistryService, command: Commands) -> Result<ActionResult> {
    let result = match command {
        Commands::List {
            filters,
            ordering,
            page,
            page_size,
        } => {
            let ordering = ordering.map(|o| o.parse::<Ordering>()).transpose()?;
            service
                .list(parse_filters(&filters)?, ordering, Some(page), Some(page_size))
                .await?
        }
        Commands::Get { filters, format } => {
            let format: OutputFormat = format.parse()?;
            let mut result = service.get(parse_filters(&filters)?).await?;
            result.data = render(result.data, format)?;
            result
        }
        Commands::Create { data } => service.create(&parse_object(&data)?).await?,
        Commands::Update { data } => service.update(&parse_object(&data)?).await?,
        Commands::Upsert { query, data } => {
            service
                .update_or_create(parse_object(&query)?, &parse_object(&data)?)
                .await?
        }
        Commands::Delete { uuids } => service.delete(&uuids).await?,
    };
    Ok(result)
}

/// Apply the output format to a record or to each record of a list.
fn render(data: Value, format: OutputFormat) -> Result<Value> {
    match data {
        Value::Object(record) => Ok(convert_output_format(&record, format)?),
        Value::Array(records) => records
            .into_iter()
            .map(|record| render(record, format))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

/// Parse `key=value` pairs into a record; values stay strings.
fn parse_filters(pairs: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("filter `{pair}` is not in key=value form");
        };
        if key.is_empty() {
            bail!("filter `{pair}` has an empty key");
        }
        record.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(record)
}

fn parse_object(text: &str) -> Result<Record> {
    match serde_json::from_str(text).context("record is not valid JSON")? {
        Value::Object(record) => Ok(record),
        other => bail!("expected a JSON object, got {other}"),
    }
}
