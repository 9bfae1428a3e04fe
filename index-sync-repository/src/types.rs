//! Request and response types for transport operations.

use std::collections::BTreeMap;

use index_sync_shared::BulkAction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TransportError;

/// When written documents become visible to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    True,
    False,
    WaitFor,
}

/// Query-string parameters accepted by write and read operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Parameters as a JSON object, for instrumentation payloads.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Parsed response of a `_bulk` request.
///
/// Item-level failures are data: the request itself succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResponse {
    /// Time taken in milliseconds.
    pub took: u64,
    /// Whether at least one item failed.
    pub errors: bool,
    /// Per-operation results in request order.
    pub items: Vec<BulkItem>,
}

/// Result of one operation within a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    pub action: BulkAction,
    pub status: BulkItemStatus,
}

/// Status of a bulk item operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemStatus {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub result: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

/// Bulk item error details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BulkItemStatus {
    /// Check if the operation was successful.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<BTreeMap<BulkAction, BulkItemStatus>>,
}

impl BulkResponse {
    /// Parse the raw JSON response of a bulk request.
    pub fn from_value(value: Value) -> Result<Self, TransportError> {
        let raw: RawBulkResponse = serde_json::from_value(value)?;
        let items = raw
            .items
            .into_iter()
            .flat_map(|item| {
                item.into_iter()
                    .map(|(action, status)| BulkItem { action, status })
            })
            .collect();

        Ok(Self {
            took: raw.took,
            errors: raw.errors,
            items,
        })
    }

    /// Items that did not succeed.
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItem> {
        self.items.iter().filter(|item| !item.status.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.failed_items().count()
    }
}

/// Name and version of the engine behind a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    /// `opensearch` or `elasticsearch`.
    pub distribution: String,
    /// Version number, e.g. `2.11.0`.
    pub version: String,
}

impl EngineInfo {
    /// Parse the root endpoint (`GET /`) response.
    pub fn from_value(value: &Value) -> Result<Self, TransportError> {
        let version = value
            .pointer("/version/number")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::serialization("missing version.number"))?;
        let distribution = value
            .pointer("/version/distribution")
            .and_then(Value::as_str)
            .unwrap_or("elasticsearch");

        Ok(Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
        })
    }

    pub fn major_version(&self) -> u32 {
        self.version
            .split('.')
            .next()
            .and_then(|major| major.parse().ok())
            .unwrap_or(0)
    }

    pub fn is_opensearch(&self) -> bool {
        self.distribution == "opensearch"
    }

    /// Whether bulk headers may still carry a `_type`.
    ///
    /// Mapping types were removed in Elasticsearch 7 and never existed in
    /// OpenSearch.
    pub fn supports_mapping_types(&self) -> bool {
        !self.is_opensearch() && self.major_version() < 7
    }
}
