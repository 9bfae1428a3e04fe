//! The import driver.

use std::collections::HashMap;

use chrono::Utc;
use futures::StreamExt;
use index_sync_repository::{AliasOperations, IndexOperations, Transport};
use index_sync_shared::{Document, DocumentIdentity};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{ImportOptions, Index};
use crate::errors::PipelineError;
use crate::loader::BulkLoader;
use crate::repository::IndexRepository;

impl Index {
    /// Import every selected repository into the index.
    ///
    /// Each batch is serialized, enriched with the eager attributes, indexed,
    /// and then followed by one partial-update request per lazy attribute.
    /// Remote errors abort the import; batches already sent stay indexed.
    ///
    /// Returns the number of serialized documents seen, including those
    /// without an id that were never sent.
    #[instrument(skip(self, transport, options), fields(index = %self.name))]
    pub async fn import(
        &self,
        transport: &Transport,
        options: ImportOptions,
    ) -> Result<usize, PipelineError> {
        let repositories = self.select_repositories(options.repositories.as_deref())?;
        let target = self.index_name(transport, options.suffix.as_deref());

        let mut loader =
            BulkLoader::connect(transport, target.clone(), self.bulk_wait_interval(transport))?
                .with_params(options.params.clone());

        let mut count = 0;
        for repository in repositories {
            count += import_repository(repository.as_ref(), &mut loader, &options).await?;
        }

        if options.refresh {
            transport.refresh(&target).await?;
        }

        let summary = loader.into_summary();
        info!(
            target = %target,
            count = count,
            requests = summary.requests,
            "Import finished"
        );
        Ok(count)
    }

    /// Rebuild the index under a fresh suffix and move the alias onto it.
    ///
    /// Creates `name_suffix`, imports into it, points the `name` alias at it
    /// and deletes the indices the alias pointed to before. The suffix is a
    /// UTC timestamp unless the options carry one.
    #[instrument(skip(self, transport, options), fields(index = %self.name))]
    pub async fn reset_index(
        &self,
        transport: &Transport,
        options: ImportOptions,
    ) -> Result<usize, PipelineError> {
        let suffix = options
            .suffix
            .clone()
            .unwrap_or_else(|| Utc::now().format("%Y%m%d%H%M%S").to_string());
        let alias = self.index_name(transport, None);
        let target = self.index_name(transport, Some(&suffix));

        self.create_index(transport, Some(&suffix)).await?;
        let count = self.import(transport, options.with_suffix(suffix)).await?;

        let previous = transport.aliased_indices(&alias).await?;
        let mut actions: Vec<Value> = previous
            .iter()
            .filter(|index| **index != target)
            .map(|index| json!({ "remove": { "index": index, "alias": alias } }))
            .collect();
        actions.push(json!({ "add": { "index": target, "alias": alias } }));
        transport
            .update_aliases(&json!({ "actions": actions }))
            .await?;

        for index in previous.iter().filter(|index| **index != target) {
            transport.delete_index(index).await?;
        }

        info!(
            alias = %alias,
            target = %target,
            replaced = previous.len(),
            count = count,
            "Index reset"
        );
        Ok(count)
    }
}

async fn import_repository(
    repository: &dyn IndexRepository,
    loader: &mut BulkLoader<'_>,
    options: &ImportOptions,
) -> Result<usize, PipelineError> {
    let registered = repository.lazy_attribute_names();
    let eager = options.eager.select(&registered);
    let lazy: Vec<String> = options
        .lazy
        .select(&registered)
        .into_iter()
        .filter(|name| !eager.contains(name))
        .collect();

    debug!(
        repository = repository.document_type(),
        eager = ?eager,
        lazy = ?lazy,
        "Importing repository"
    );

    let mut batches = repository.each_serialized_batch(&options.context)?;
    let mut count = 0;
    let mut batch_number = 0;

    while let Some(batch) = batches.next().await {
        let mut documents = batch?;
        batch_number += 1;

        for name in &eager {
            merge_attribute(repository, name, &mut documents).await?;
        }

        let builder = loader.builder().index(&documents);
        loader.send(builder).await?;

        for name in &lazy {
            let partials = repository
                .resolve_lazy_attribute(name, valid_identities(&documents))
                .await?;
            if partials.is_empty() {
                continue;
            }
            let builder = loader.builder().update(&partials);
            loader.send(builder).await?;
        }

        count += documents.len();
        debug!(
            repository = repository.document_type(),
            batch = batch_number,
            documents = documents.len(),
            "Imported batch"
        );
    }

    Ok(count)
}

/// Resolve `name` for the batch and merge the values in as mutations.
async fn merge_attribute(
    repository: &dyn IndexRepository,
    name: &str,
    documents: &mut [Document],
) -> Result<(), PipelineError> {
    let partials = repository
        .resolve_lazy_attribute(name, valid_identities(documents))
        .await?;

    let values: HashMap<DocumentIdentity, Value> = partials
        .into_iter()
        .filter_map(|partial| {
            let value = partial.source().get(name)?.clone();
            Some((partial.identity().clone(), value))
        })
        .collect();

    for document in documents.iter_mut() {
        if let Some(value) = values.get(document.identity()) {
            document.mutate(name, value.clone());
        }
    }
    Ok(())
}

fn valid_identities(documents: &[Document]) -> Vec<DocumentIdentity> {
    documents
        .iter()
        .filter(|document| document.is_valid())
        .map(|document| document.identity().clone())
        .collect()
}
