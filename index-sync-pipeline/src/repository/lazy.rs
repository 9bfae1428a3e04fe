//! Lazy attribute computations.
//!
//! A lazy attribute is a document field that is too expensive to compute per
//! record in the serializer. It is resolved out of band, once per batch, for
//! a whole list of identities.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use index_sync_shared::DocumentIdentity;
use serde_json::{Map, Value};

use crate::errors::PipelineError;

/// Options registered alongside a lazy attribute and handed to every call.
pub type LazyAttributeOptions = Map<String, Value>;

/// Values computed for a list of identities.
///
/// A missing key means "no value" for that document. A `null` value is kept
/// and sent as an explicit update.
pub type LazyAttributeValues = HashMap<DocumentIdentity, Value>;

/// Batched computation of one lazy attribute.
#[async_trait]
pub trait LazyAttribute: Send + Sync {
    async fn resolve(
        &self,
        identities: &[DocumentIdentity],
        options: &LazyAttributeOptions,
    ) -> Result<LazyAttributeValues, PipelineError>;
}

/// Adapter turning an async closure into a [`LazyAttribute`].
///
/// ```ignore
/// let tags = LazyAttributeFn::new(|ids, _options| async move {
///     Ok(load_tags(&ids).await)
/// });
/// ```
pub struct LazyAttributeFn<F> {
    f: F,
}

impl<F> LazyAttributeFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> LazyAttribute for LazyAttributeFn<F>
where
    F: Fn(Vec<DocumentIdentity>, LazyAttributeOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LazyAttributeValues, PipelineError>> + Send + 'static,
{
    async fn resolve(
        &self,
        identities: &[DocumentIdentity],
        options: &LazyAttributeOptions,
    ) -> Result<LazyAttributeValues, PipelineError> {
        (self.f)(identities.to_vec(), options.clone()).await
    }
}

/// A lazy attribute as registered on a repository.
pub(crate) struct LazyAttributeEntry {
    pub(crate) name: String,
    pub(crate) computation: Box<dyn LazyAttribute>,
    pub(crate) options: LazyAttributeOptions,
}
