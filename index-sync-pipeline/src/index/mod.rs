//! Index definitions.
//!
//! An [`Index`] names a target index, carries its settings and mappings, and
//! owns the repositories whose documents live in it. It is built once
//! through [`IndexBuilder`] and passed by reference to every operation, each
//! of which runs against an explicit [`Transport`].

mod import;
mod options;

pub use options::{AttributeSelector, BulkOptions, ImportOptions};

use std::sync::Arc;
use std::time::Duration;

use index_sync_repository::{IndexOperations, RequestParams, Transport};
use index_sync_shared::IntoIdentity;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::errors::PipelineError;
use crate::loader::{BulkLoader, BulkSummary};
use crate::repository::IndexRepository;

/// A search index and the repositories that feed it.
pub struct Index {
    name: String,
    settings: Option<Value>,
    mappings: Option<Value>,
    bulk_wait_interval: Option<Duration>,
    repositories: Vec<Arc<dyn IndexRepository>>,
}

impl Index {
    pub fn builder(name: impl Into<String>) -> IndexBuilder {
        IndexBuilder::new(name)
    }

    /// Base name, before cluster prefix and suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> Option<&Value> {
        self.settings.as_ref()
    }

    pub fn mappings(&self) -> Option<&Value> {
        self.mappings.as_ref()
    }

    pub fn repositories(&self) -> &[Arc<dyn IndexRepository>] {
        &self.repositories
    }

    pub fn repository(&self, document_type: &str) -> Option<&Arc<dyn IndexRepository>> {
        self.repositories
            .iter()
            .find(|repository| repository.document_type() == document_type)
    }

    /// Full index name on the transport's cluster: `[prefix_]name[_suffix]`.
    pub fn index_name(&self, transport: &Transport, suffix: Option<&str>) -> String {
        transport.cluster().index_name(&self.name, suffix)
    }

    /// Pause between bulk requests; the index value wins over the cluster's.
    pub fn bulk_wait_interval(&self, transport: &Transport) -> Duration {
        self.bulk_wait_interval
            .unwrap_or(transport.cluster().bulk_wait_interval)
    }

    /// Body of the create-index request.
    pub fn create_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(settings) = &self.settings {
            body.insert("settings".to_string(), settings.clone());
        }
        if let Some(mappings) = &self.mappings {
            body.insert("mappings".to_string(), mappings.clone());
        }
        Value::Object(body)
    }

    /// Create the index. Returns `false` when it already exists.
    pub async fn create_index(
        &self,
        transport: &Transport,
        suffix: Option<&str>,
    ) -> Result<bool, PipelineError> {
        let index = self.index_name(transport, suffix);
        Ok(transport.create_index(&index, &self.create_body()).await?)
    }

    pub async fn delete_index(
        &self,
        transport: &Transport,
        suffix: Option<&str>,
    ) -> Result<bool, PipelineError> {
        let index = self.index_name(transport, suffix);
        Ok(transport.delete_index(&index).await?)
    }

    pub async fn index_exists(
        &self,
        transport: &Transport,
        suffix: Option<&str>,
    ) -> Result<bool, PipelineError> {
        let index = self.index_name(transport, suffix);
        Ok(transport.index_exists(&index).await?)
    }

    /// Send explicit documents, grouped by action.
    #[instrument(skip(self, transport, options), fields(index = %self.name))]
    pub async fn bulk(
        &self,
        transport: &Transport,
        options: BulkOptions,
    ) -> Result<BulkSummary, PipelineError> {
        let target = self.index_name(transport, options.suffix.as_deref());
        let mut loader = BulkLoader::connect(transport, target, self.bulk_wait_interval(transport))?
            .with_params(options.params);

        let builder = loader
            .builder()
            .delete(&options.delete)
            .create(&options.create)
            .index(&options.index)
            .update(&options.update);
        loader.send(builder).await?;

        Ok(loader.into_summary())
    }

    /// Resolve one lazy attribute for the given documents and send it as
    /// partial updates.
    #[instrument(skip(self, transport, identities, params), fields(index = %self.name))]
    pub async fn update_documents_attribute<I, T>(
        &self,
        transport: &Transport,
        document_type: &str,
        attribute: &str,
        identities: I,
        suffix: Option<&str>,
        params: RequestParams,
    ) -> Result<BulkSummary, PipelineError>
    where
        I: IntoIterator<Item = T>,
        T: IntoIdentity,
    {
        let repository = self.repository(document_type).ok_or_else(|| {
            PipelineError::configuration(format!(
                "no repository '{}' in index '{}'",
                document_type, self.name
            ))
        })?;
        let identities = identities
            .into_iter()
            .map(IntoIdentity::into_identity)
            .collect::<Result<Vec<_>, _>>()?;

        let partials = repository.resolve_lazy_attribute(attribute, identities).await?;
        if partials.is_empty() {
            info!(attribute = attribute, "Nothing to update");
            return Ok(BulkSummary::default());
        }

        let target = self.index_name(transport, suffix);
        let mut loader = BulkLoader::connect(transport, target, self.bulk_wait_interval(transport))?
            .with_params(params);
        let builder = loader.builder().update(&partials);
        loader.send(builder).await?;

        Ok(loader.into_summary())
    }

    fn select_repositories(
        &self,
        names: Option<&[String]>,
    ) -> Result<Vec<&Arc<dyn IndexRepository>>, PipelineError> {
        match names {
            None => Ok(self.repositories.iter().collect()),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.repository(name).ok_or_else(|| {
                        PipelineError::configuration(format!(
                            "no repository '{}' in index '{}'",
                            name, self.name
                        ))
                    })
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<&str> = self
            .repositories
            .iter()
            .map(|repository| repository.document_type())
            .collect();
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("repositories", &types)
            .field("bulk_wait_interval", &self.bulk_wait_interval)
            .finish()
    }
}

/// Builder for [`Index`].
pub struct IndexBuilder {
    name: String,
    settings: Option<Value>,
    mappings: Option<Value>,
    bulk_wait_interval: Option<Duration>,
    repositories: Vec<Arc<dyn IndexRepository>>,
}

impl IndexBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: None,
            mappings: None,
            bulk_wait_interval: None,
            repositories: Vec::new(),
        }
    }

    pub fn settings(mut self, settings: Value) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn mappings(mut self, mappings: Value) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Override the cluster's bulk wait interval for this index.
    pub fn bulk_wait_interval(mut self, interval: Duration) -> Self {
        self.bulk_wait_interval = Some(interval);
        self
    }

    pub fn repository(mut self, repository: impl IndexRepository + 'static) -> Self {
        self.repositories.push(Arc::new(repository));
        self
    }

    /// Finish the definition. Document types must be unique.
    pub fn build(self) -> Result<Index, PipelineError> {
        for (position, repository) in self.repositories.iter().enumerate() {
            let duplicate = self.repositories[..position]
                .iter()
                .any(|other| other.document_type() == repository.document_type());
            if duplicate {
                return Err(PipelineError::configuration(format!(
                    "repository '{}' registered twice in index '{}'",
                    repository.document_type(),
                    self.name
                )));
            }
        }

        Ok(Index {
            name: self.name,
            settings: self.settings,
            mappings: self.mappings,
            bulk_wait_interval: self.bulk_wait_interval,
            repositories: self.repositories,
        })
    }
}
