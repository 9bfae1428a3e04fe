//! Repository module for the synchronization pipeline.
//!
//! A repository binds one document type to its collection, its serializer and
//! the lazy attributes that can be resolved for its documents. Repositories
//! are assembled once through [`RepositoryBuilder`] and are immutable after.

mod lazy;

pub use lazy::{
    LazyAttribute, LazyAttributeFn, LazyAttributeOptions, LazyAttributeValues,
};

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use index_sync_shared::{Document, DocumentId, DocumentIdentity, IntoIdentity};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::collection::{Collection, Context};
use crate::errors::PipelineError;
use crate::serializer::{DocumentSerializer, Serializer};
use lazy::LazyAttributeEntry;

/// Type-erased view of a repository, as held by an index.
///
/// Lets one index carry repositories over different record types.
#[async_trait]
pub trait IndexRepository: Send + Sync {
    fn document_type(&self) -> &str;

    /// Registered lazy attribute names, in registration order.
    fn lazy_attribute_names(&self) -> Vec<String>;

    /// Stream the collection as serialized document batches.
    ///
    /// Vetoed records are dropped; batch boundaries are kept. Fails at once
    /// when no collection or serializer is registered.
    fn each_serialized_batch<'a>(
        &'a self,
        context: &'a Context,
    ) -> Result<BoxStream<'a, Result<Vec<Document>, PipelineError>>, PipelineError>;

    /// Resolve the named lazy attribute into minimal `{name: value}` documents.
    ///
    /// Invalid identities are dropped and duplicates collapsed before the
    /// computation runs. A value keyed by an identity with the same id counts
    /// when no key matches exactly. Identities the computation has no value
    /// for are left out of the result.
    async fn resolve_lazy_attribute(
        &self,
        name: &str,
        identities: Vec<DocumentIdentity>,
    ) -> Result<Vec<Document>, PipelineError>;
}

/// Binding of a document type to its data source and serialization rules.
pub struct Repository<R> {
    document_type: String,
    collection: Option<Arc<dyn Collection<R>>>,
    serializer: Option<Arc<dyn DocumentSerializer<R>>>,
    lazy_attributes: Vec<LazyAttributeEntry>,
}

impl<R: Send + 'static> Repository<R> {
    pub fn builder(document_type: impl Into<String>) -> RepositoryBuilder<R> {
        RepositoryBuilder::new(document_type)
    }

    /// Serialize a single record with the registered serializer.
    ///
    /// The repository's document type is stamped onto documents without one.
    pub fn serialize(&self, record: &R, context: &Context) -> Result<Option<Document>, PipelineError> {
        let serializer = self.serializer()?;
        Ok(serializer.serialize(record, context)?.map(|mut document| {
            document.ensure_type(&self.document_type);
            document
        }))
    }

    /// Resolve a lazy attribute for anything coercible to an identity.
    pub async fn documents_for_lazy_attribute<I, T>(
        &self,
        name: &str,
        inputs: I,
    ) -> Result<Vec<Document>, PipelineError>
    where
        I: IntoIterator<Item = T>,
        T: IntoIdentity,
    {
        let identities = inputs
            .into_iter()
            .map(IntoIdentity::into_identity)
            .collect::<Result<Vec<_>, _>>()?;
        self.resolve_lazy_attribute(name, identities).await
    }

    fn serializer(&self) -> Result<&Arc<dyn DocumentSerializer<R>>, PipelineError> {
        self.serializer.as_ref().ok_or_else(|| {
            PipelineError::configuration(format!(
                "no serializer registered for '{}'",
                self.document_type
            ))
        })
    }

    fn lazy_attribute(&self, name: &str) -> Result<&LazyAttributeEntry, PipelineError> {
        self.lazy_attributes
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| {
                PipelineError::configuration(format!(
                    "no lazy attribute '{}' registered for '{}'",
                    name, self.document_type
                ))
            })
    }
}

#[async_trait]
impl<R: Send + 'static> IndexRepository for Repository<R> {
    fn document_type(&self) -> &str {
        &self.document_type
    }

    fn lazy_attribute_names(&self) -> Vec<String> {
        self.lazy_attributes
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    fn each_serialized_batch<'a>(
        &'a self,
        context: &'a Context,
    ) -> Result<BoxStream<'a, Result<Vec<Document>, PipelineError>>, PipelineError> {
        let collection = self.collection.as_ref().ok_or_else(|| {
            PipelineError::configuration(format!(
                "no collection registered for '{}'",
                self.document_type
            ))
        })?;
        self.serializer()?;

        let batches = collection.batches(context).map(move |batch| {
            let batch = batch?;
            let mut documents = Vec::with_capacity(batch.len());
            for record in &batch.records {
                if let Some(document) = self.serialize(record, &batch.context)? {
                    documents.push(document);
                }
            }
            Ok(documents)
        });
        Ok(batches.boxed())
    }

    #[instrument(skip(self, identities), fields(repository = %self.document_type, requested = identities.len()))]
    async fn resolve_lazy_attribute(
        &self,
        name: &str,
        identities: Vec<DocumentIdentity>,
    ) -> Result<Vec<Document>, PipelineError> {
        let entry = self.lazy_attribute(name)?;

        let mut seen = HashSet::new();
        let identities: Vec<DocumentIdentity> = identities
            .into_iter()
            .filter(|identity| identity.is_valid() && seen.insert(identity.clone()))
            .collect();
        if identities.is_empty() {
            return Ok(Vec::new());
        }

        let values = entry.computation.resolve(&identities, &entry.options).await?;
        let values = match_values(identities, values);

        let documents: Vec<Document> = values
            .into_iter()
            .map(|(identity, value)| {
                let mut source = Map::new();
                source.insert(name.to_string(), value);
                Document::with_identity(identity, source)
            })
            .collect();

        debug!(resolved = documents.len(), "Resolved lazy attribute");
        Ok(documents)
    }
}

/// Pair each requested identity with its computed value, in request order.
///
/// A key equal to the identity wins. Otherwise a key carrying the same id is
/// used, so computations may key their result by id alone.
fn match_values(
    identities: Vec<DocumentIdentity>,
    mut values: LazyAttributeValues,
) -> Vec<(DocumentIdentity, Value)> {
    let exact: Vec<Option<Value>> = identities
        .iter()
        .map(|identity| values.remove(identity))
        .collect();

    let mut by_id: HashMap<DocumentId, Value> = HashMap::new();
    for (key, value) in values {
        if let Some(id) = key.id {
            by_id.entry(id).or_insert(value);
        }
    }

    identities
        .into_iter()
        .zip(exact)
        .filter_map(|(identity, exact)| {
            let value = match exact {
                Some(value) => value,
                None => by_id.get(identity.id.as_ref()?)?.clone(),
            };
            Some((identity, value))
        })
        .collect()
}

impl<R> fmt::Debug for Repository<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.lazy_attributes.iter().map(|e| e.name.as_str()).collect();
        f.debug_struct("Repository")
            .field("document_type", &self.document_type)
            .field("has_collection", &self.collection.is_some())
            .field("has_serializer", &self.serializer.is_some())
            .field("lazy_attributes", &names)
            .finish()
    }
}

/// Builder for [`Repository`].
pub struct RepositoryBuilder<R> {
    document_type: String,
    collection: Option<Arc<dyn Collection<R>>>,
    serializer: Option<Arc<dyn DocumentSerializer<R>>>,
    lazy_attributes: Vec<LazyAttributeEntry>,
}

impl<R: Send + 'static> RepositoryBuilder<R> {
    pub fn new(document_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            collection: None,
            serializer: None,
            lazy_attributes: Vec::new(),
        }
    }

    pub fn collection(mut self, collection: impl Collection<R> + 'static) -> Self {
        self.collection = Some(Arc::new(collection));
        self
    }

    pub fn serializer(mut self, serializer: Serializer<R>) -> Self {
        self.serializer = Some(serializer.normalize());
        self
    }

    /// Register a lazy attribute. Names must be unique per repository.
    pub fn lazy_attribute(
        mut self,
        name: impl Into<String>,
        computation: impl LazyAttribute + 'static,
        options: LazyAttributeOptions,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        if self.lazy_attributes.iter().any(|entry| entry.name == name) {
            return Err(PipelineError::configuration(format!(
                "lazy attribute '{}' already registered for '{}'",
                name, self.document_type
            )));
        }
        self.lazy_attributes.push(LazyAttributeEntry {
            name,
            computation: Box::new(computation),
            options,
        });
        Ok(self)
    }

    pub fn build(self) -> Repository<R> {
        Repository {
            document_type: self.document_type,
            collection: self.collection,
            serializer: self.serializer,
            lazy_attributes: self.lazy_attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::VecCollection;
    use futures::TryStreamExt;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn serializer() -> Serializer<i64> {
        Serializer::closure(|id: &i64, _ctx: &Context| {
            if *id < 0 {
                return Ok(None);
            }
            let mut source = Map::new();
            source.insert("n".to_string(), json!(id));
            Ok(Some(Document::new(*id, source)))
        })
    }

    fn tags() -> LazyAttributeFn<
        impl Fn(Vec<DocumentIdentity>, LazyAttributeOptions) -> futures::future::Ready<Result<LazyAttributeValues, PipelineError>>
            + Send
            + Sync
            + 'static,
    > {
        LazyAttributeFn::new(|ids: Vec<DocumentIdentity>, _options: LazyAttributeOptions| {
            let values: LazyAttributeValues = ids
                .into_iter()
                .filter_map(|identity| {
                    let value = match identity.id.as_ref()?.to_string().as_str() {
                        "1" => json!(["a"]),
                        "2" => json!(["b"]),
                        _ => return None,
                    };
                    Some((identity, value))
                })
                .collect();
            futures::future::ready(Ok(values))
        })
    }

    #[test]
    fn test_serialize_without_serializer_is_configuration_error() {
        let repository: Repository<i64> = Repository::builder("user").build();
        let err = repository.serialize(&1, &Context::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_serialize_stamps_document_type() {
        let repository = Repository::builder("user").serializer(serializer()).build();
        let document = repository.serialize(&1, &Context::new()).unwrap().unwrap();
        assert_eq!(document.doc_type(), Some("user"));
    }

    #[test]
    fn test_each_serialized_batch_requires_collection() {
        let repository = Repository::builder("user").serializer(serializer()).build();
        let context = Context::new();
        assert!(matches!(
            repository.each_serialized_batch(&context),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_each_serialized_batch_drops_vetoed_records() {
        let repository = Repository::builder("user")
            .collection(VecCollection::new(vec![1, -2, 3, 4, -5]).with_batch_size(2))
            .serializer(serializer())
            .build();
        let context = Context::new();

        let batches: Vec<Vec<Document>> = repository
            .each_serialized_batch(&context)
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<Vec<String>> = batches
            .iter()
            .map(|batch| batch.iter().map(|d| d.id().unwrap().to_string()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["1"], vec!["3", "4"], vec![]]);
    }

    #[test]
    fn test_duplicate_lazy_attribute_is_rejected() {
        let result = Repository::<i64>::builder("user")
            .lazy_attribute("tags", tags(), Map::new())
            .unwrap()
            .lazy_attribute("tags", tags(), Map::new());
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_lazy_resolution_skips_missing_values() {
        let repository = Repository::<i64>::builder("user")
            .lazy_attribute("tags", tags(), Map::new())
            .unwrap()
            .build();

        let documents = repository
            .documents_for_lazy_attribute("tags", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].identity(), &DocumentIdentity::new(1));
        assert_eq!(documents[0].source()["tags"], json!(["a"]));
        assert_eq!(documents[1].source().len(), 1);
    }

    #[tokio::test]
    async fn test_lazy_resolution_filters_and_deduplicates_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let computation = LazyAttributeFn::new(move |ids: Vec<DocumentIdentity>, options: LazyAttributeOptions| {
            seen.fetch_add(1, Ordering::SeqCst);
            let values: LazyAttributeValues = ids
                .into_iter()
                .map(|identity| (identity, options["default"].clone()))
                .collect();
            async move { Ok::<_, PipelineError>(values) }
        });
        let mut options = Map::new();
        options.insert("default".to_string(), Value::Null);

        let repository = Repository::<i64>::builder("user")
            .lazy_attribute("score", computation, options)
            .unwrap()
            .build();

        let documents = repository
            .documents_for_lazy_attribute(
                "score",
                vec![json!(1), json!(null), json!({"_id": 1}), json!("2")],
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let ids: Vec<String> = documents.iter().map(|d| d.id().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        // null values are kept as explicit update targets
        assert_eq!(documents[0].source()["score"], Value::Null);
    }

    fn tags_by_id() -> LazyAttributeFn<
        impl Fn(Vec<DocumentIdentity>, LazyAttributeOptions) -> futures::future::Ready<Result<LazyAttributeValues, PipelineError>>
            + Send
            + Sync
            + 'static,
    > {
        LazyAttributeFn::new(|_ids: Vec<DocumentIdentity>, _options: LazyAttributeOptions| {
            let mut values = LazyAttributeValues::new();
            values.insert(DocumentIdentity::new(1), json!(["a"]));
            values.insert(DocumentIdentity::new(2), json!(["b"]));
            futures::future::ready(Ok(values))
        })
    }

    #[tokio::test]
    async fn test_lazy_values_keyed_by_id_alone() {
        let repository = Repository::<i64>::builder("user")
            .lazy_attribute("tags", tags_by_id(), Map::new())
            .unwrap()
            .build();

        let documents = repository
            .documents_for_lazy_attribute(
                "tags",
                vec![
                    json!({"_id": 1, "_type": "user"}),
                    json!({"_id": 2, "_type": "user", "routing": "r2"}),
                    json!({"_id": 3, "_type": "user"}),
                ],
            )
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(
            documents[0].identity(),
            &DocumentIdentity::new(1).with_type("user")
        );
        assert_eq!(documents[0].source()["tags"], json!(["a"]));
        assert_eq!(
            documents[1].identity(),
            &DocumentIdentity::new(2).with_type("user").with_routing("r2")
        );
        assert_eq!(documents[1].source()["tags"], json!(["b"]));
    }

    #[tokio::test]
    async fn test_exact_identity_wins_over_id_match() {
        let computation = LazyAttributeFn::new(|_ids: Vec<DocumentIdentity>, _options: LazyAttributeOptions| {
            let mut values = LazyAttributeValues::new();
            values.insert(DocumentIdentity::new(1), json!("by id"));
            values.insert(DocumentIdentity::new(1).with_routing("eu"), json!("exact"));
            async move { Ok::<_, PipelineError>(values) }
        });
        let repository = Repository::<i64>::builder("user")
            .lazy_attribute("region", computation, Map::new())
            .unwrap()
            .build();

        let documents = repository
            .documents_for_lazy_attribute(
                "region",
                vec![DocumentIdentity::new(1).with_routing("eu")],
            )
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source()["region"], json!("exact"));
    }

    #[tokio::test]
    async fn test_unknown_lazy_attribute_is_configuration_error() {
        let repository: Repository<i64> = Repository::builder("user").build();
        let err = repository
            .documents_for_lazy_attribute("missing", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_malformed_identity_is_coercion_error() {
        let repository = Repository::<i64>::builder("user")
            .lazy_attribute("tags", tags(), Map::new())
            .unwrap()
            .build();
        let err = repository
            .documents_for_lazy_attribute("tags", vec![json!([1, 2])])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Coercion(_)));
    }
}
