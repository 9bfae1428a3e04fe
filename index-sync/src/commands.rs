//! Command line operations.
//!
//! Every command builds an [`Index`] holding a single repository fed by a
//! [`JsonLinesCollection`], then runs against the configured transport.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use index_sync_pipeline::{
    Context, ImportOptions, Index, Repository, Serializer, DEFAULT_BATCH_SIZE,
};
use index_sync_repository::Transport;
use serde_json::Value;
use tracing::{info, warn};

use crate::source::{JsonLinesCollection, JsonRecordSerializer, Record, DEFAULT_ID_FIELD};
use crate::IndexingError;

/// Document type used when none is given.
pub const DEFAULT_DOCUMENT_TYPE: &str = "doc";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import an NDJSON file into an existing index
    Import(ImportArgs),
    /// Import into a fresh index and move the alias onto it
    Reset(ImportArgs),
    /// Create an index
    Create(IndexArgs),
    /// Delete an index
    Delete(IndexArgs),
}

/// Target index.
#[derive(Debug, Clone, Args)]
pub struct IndexArgs {
    /// Index name, before prefix and suffix
    #[arg(long)]
    pub index: String,

    /// Suffix appended to the index name
    #[arg(long)]
    pub suffix: Option<String>,

    /// JSON file with the index `settings` and `mappings`
    #[arg(long)]
    pub definition: Option<PathBuf>,
}

/// Source file and import options.
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub target: IndexArgs,

    /// NDJSON file, one record per line
    #[arg(long)]
    pub input: PathBuf,

    /// Document type of the imported records
    #[arg(long, default_value = DEFAULT_DOCUMENT_TYPE)]
    pub document_type: String,

    /// Record field holding the document id
    #[arg(long, default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// Record field holding the routing value
    #[arg(long)]
    pub routing_field: Option<String>,

    /// Records per batch
    #[arg(long, env = "IMPORT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// JSON object passed to the serializer as context
    #[arg(long)]
    pub context: Option<String>,

    /// Refresh the index once the import is done
    #[arg(long)]
    pub refresh: bool,
}

impl ImportArgs {
    pub fn import_options(&self) -> Result<ImportOptions, IndexingError> {
        let mut options = ImportOptions::new()
            .with_context(self.parse_context()?)
            .with_refresh(self.refresh);
        if let Some(suffix) = &self.target.suffix {
            options = options.with_suffix(suffix.clone());
        }
        Ok(options)
    }

    fn parse_context(&self) -> Result<Context, IndexingError> {
        let Some(raw) = &self.context else {
            return Ok(Context::new());
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(context)) => Ok(context),
            Ok(_) => Err(IndexingError::config("--context must be a JSON object")),
            Err(e) => Err(IndexingError::config(format!("Invalid --context: {}", e))),
        }
    }

    fn repository(&self) -> Repository<Record> {
        let mut serializer = JsonRecordSerializer::new(&self.id_field);
        if let Some(field) = &self.routing_field {
            serializer = serializer.with_routing_field(field);
        }

        Repository::builder(&self.document_type)
            .collection(JsonLinesCollection::new(&self.input).with_batch_size(self.batch_size))
            .serializer(Serializer::object(serializer))
            .build()
    }
}

/// Build the index definition for `target`, optionally with one repository.
pub async fn build_index(
    target: &IndexArgs,
    source: Option<&ImportArgs>,
) -> Result<Index, IndexingError> {
    let mut builder = Index::builder(&target.index);

    if let Some(path) = &target.definition {
        let raw = tokio::fs::read_to_string(path).await?;
        let definition: Value = serde_json::from_str(&raw).map_err(|e| {
            IndexingError::config(format!("Invalid index definition {}: {}", path.display(), e))
        })?;
        if let Some(settings) = definition.get("settings") {
            builder = builder.settings(settings.clone());
        }
        if let Some(mappings) = definition.get("mappings") {
            builder = builder.mappings(mappings.clone());
        }
    }

    if let Some(source) = source {
        builder = builder.repository(source.repository());
    }

    Ok(builder.build()?)
}

/// Run one command against `transport`.
pub async fn run(command: Command, transport: &Transport) -> Result<(), IndexingError> {
    match command {
        Command::Import(args) => {
            let index = build_index(&args.target, Some(&args)).await?;
            let count = index.import(transport, args.import_options()?).await?;
            info!(index = %index.name(), count = count, "Import complete");
        }
        Command::Reset(args) => {
            let index = build_index(&args.target, Some(&args)).await?;
            let count = index.reset_index(transport, args.import_options()?).await?;
            info!(index = %index.name(), count = count, "Reset complete");
        }
        Command::Create(args) => {
            let index = build_index(&args, None).await?;
            let name = index.index_name(transport, args.suffix.as_deref());
            if index.create_index(transport, args.suffix.as_deref()).await? {
                info!(index = %name, "Index created");
            } else {
                warn!(index = %name, "Index already exists");
            }
        }
        Command::Delete(args) => {
            let index = build_index(&args, None).await?;
            let name = index.index_name(transport, args.suffix.as_deref());
            if index.delete_index(transport, args.suffix.as_deref()).await? {
                info!(index = %name, "Index deleted");
            } else {
                warn!(index = %name, "Index not found");
            }
        }
    }
    Ok(())
}
