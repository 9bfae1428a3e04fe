//! Low-level search engine trait definition.
//!
//! This module defines the raw interface to a search engine, allowing for
//! different backend implementations (OpenSearch, mocks, etc.). Methods
//! return raw JSON bodies or an uncoerced [`EngineError`].

use async_trait::async_trait;
use index_sync_shared::BulkRequestBody;
use serde_json::Value;

use crate::errors::EngineError;
use crate::types::RequestParams;

/// Abstract interface for raw search engine calls.
///
/// Implementations perform network I/O and nothing else: no readonly
/// checks, no error coercion, no instrumentation. Those live in
/// [`crate::Transport`].
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Root endpoint: distribution and version information.
    async fn info(&self) -> Result<Value, EngineError>;

    /// Cluster health.
    async fn health(&self) -> Result<Value, EngineError>;

    /// Send a bulk body to `index`.
    async fn bulk(
        &self,
        index: &str,
        body: &BulkRequestBody,
        params: &RequestParams,
    ) -> Result<Value, EngineError>;

    /// Create `index` with the given settings/mappings/aliases body.
    async fn create_index(&self, index: &str, body: &Value) -> Result<Value, EngineError>;

    async fn delete_index(&self, index: &str) -> Result<Value, EngineError>;

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError>;

    async fn put_mapping(&self, index: &str, mapping: &Value) -> Result<Value, EngineError>;

    async fn put_settings(&self, index: &str, settings: &Value) -> Result<Value, EngineError>;

    /// Apply an `_aliases` actions body.
    async fn update_aliases(&self, actions: &Value) -> Result<Value, EngineError>;

    /// Indices currently pointed to by `alias`, keyed by index name.
    async fn get_alias(&self, alias: &str) -> Result<Value, EngineError>;

    async fn open_index(&self, index: &str) -> Result<Value, EngineError>;

    async fn close_index(&self, index: &str) -> Result<Value, EngineError>;

    async fn refresh(&self, index: &str) -> Result<Value, EngineError>;

    async fn get_document(
        &self,
        index: &str,
        id: &str,
        params: &RequestParams,
    ) -> Result<Value, EngineError>;

    async fn document_exists(
        &self,
        index: &str,
        id: &str,
        params: &RequestParams,
    ) -> Result<bool, EngineError>;

    /// Count documents, optionally restricted by a query body.
    async fn count(&self, index: &str, query: Option<&Value>) -> Result<Value, EngineError>;

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
        params: &RequestParams,
    ) -> Result<Value, EngineError>;

    /// Partial update; `body` is the full update body (`{"doc": ...}`).
    async fn update_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
        params: &RequestParams,
    ) -> Result<Value, EngineError>;

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        params: &RequestParams,
    ) -> Result<Value, EngineError>;
}
