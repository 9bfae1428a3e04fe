//! Operation-group traits implemented by the transport.
//!
//! Each group is a separate trait so that consumers can depend on only the
//! surface they use; the pipeline driver, for instance, only needs
//! [`BulkOperations`].

use std::time::Duration;

use async_trait::async_trait;
use index_sync_shared::{BulkRequestBody, Document, DocumentIdentity};
use serde_json::Value;

use crate::errors::TransportError;
use crate::types::{BulkResponse, RequestParams};

/// One physical bulk request.
#[derive(Debug, Clone, Copy)]
pub struct BulkRequest<'a> {
    /// Target index name.
    pub index: &'a str,
    /// Pre-built body; never modified by the transport.
    pub body: &'a BulkRequestBody,
    /// Query-string parameters.
    pub params: &'a RequestParams,
    /// Pause applied before the request is sent.
    pub wait_interval: Duration,
}

impl<'a> BulkRequest<'a> {
    pub fn new(index: &'a str, body: &'a BulkRequestBody, params: &'a RequestParams) -> Self {
        Self {
            index,
            body,
            params,
            wait_interval: Duration::ZERO,
        }
    }

    pub fn with_wait_interval(mut self, wait_interval: Duration) -> Self {
        self.wait_interval = wait_interval;
        self
    }
}

/// Bulk writes.
#[async_trait]
pub trait BulkOperations: Send + Sync {
    /// Send one bulk body.
    ///
    /// Item-level failures are reported in the returned [`BulkResponse`];
    /// only request-level failures are errors.
    async fn bulk(&self, request: BulkRequest<'_>) -> Result<BulkResponse, TransportError>;
}

/// Index lifecycle management.
///
/// Methods returning `bool` report whether the engine acknowledged the
/// change; `Ok(false)` means "nothing was done", not failure.
#[async_trait]
pub trait IndexOperations: Send + Sync {
    /// Create an index. Returns `Ok(false)` if it already exists.
    async fn create_index(&self, index: &str, body: &Value) -> Result<bool, TransportError>;

    async fn delete_index(&self, index: &str) -> Result<bool, TransportError>;

    async fn index_exists(&self, index: &str) -> Result<bool, TransportError>;

    async fn update_mapping(&self, index: &str, mapping: &Value) -> Result<bool, TransportError>;

    async fn update_settings(&self, index: &str, settings: &Value)
        -> Result<bool, TransportError>;

    async fn open(&self, index: &str) -> Result<bool, TransportError>;

    async fn close(&self, index: &str) -> Result<bool, TransportError>;

    async fn refresh(&self, index: &str) -> Result<(), TransportError>;
}

/// Alias management.
#[async_trait]
pub trait AliasOperations: Send + Sync {
    /// Apply `{"actions": [...]}` atomically.
    async fn update_aliases(&self, actions: &Value) -> Result<bool, TransportError>;

    /// Names of the indices the alias points to; empty if the alias is unknown.
    async fn aliased_indices(&self, alias: &str) -> Result<Vec<String>, TransportError>;
}

/// Single-document reads and writes.
#[async_trait]
pub trait DocumentOperations: Send + Sync {
    /// Fetch a document. Fails with `NotFound` if it does not exist.
    async fn get(
        &self,
        index: &str,
        identity: &DocumentIdentity,
        params: &RequestParams,
    ) -> Result<Value, TransportError>;

    async fn exist(
        &self,
        index: &str,
        identity: &DocumentIdentity,
        params: &RequestParams,
    ) -> Result<bool, TransportError>;

    async fn count(&self, index: &str, query: Option<&Value>) -> Result<u64, TransportError>;

    /// Index the document's mutated source.
    async fn index(
        &self,
        index: &str,
        document: &Document,
        params: &RequestParams,
    ) -> Result<Value, TransportError>;

    /// Partially update the document with its mutated source.
    async fn update(
        &self,
        index: &str,
        document: &Document,
        params: &RequestParams,
    ) -> Result<Value, TransportError>;

    async fn delete(
        &self,
        index: &str,
        identity: &DocumentIdentity,
        params: &RequestParams,
    ) -> Result<Value, TransportError>;
}
