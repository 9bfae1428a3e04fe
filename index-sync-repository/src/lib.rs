//! # Index Sync Repository
//!
//! This crate provides the storage-facing half of the synchronizer: the raw
//! [`SearchEngine`] seam with an OpenSearch implementation, per-cluster
//! configuration, and the guarded, instrumented [`Transport`] that every
//! index operation goes through.

pub mod config;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod opensearch;
pub mod transport;
pub mod types;

pub use config::{Cluster, ClusterRegistry, DEFAULT_BULK_MAX_BODY_BYTES, DEFAULT_CLUSTER_ID};
pub use errors::{EngineError, TransportError};
pub use events::{Event, EventName, EventSubscriber, Instrumentation};
pub use interfaces::{
    AliasOperations, BulkOperations, BulkRequest, DocumentOperations, IndexOperations,
    SearchEngine,
};
pub use self::opensearch::OpenSearchEngine;
pub use transport::Transport;
pub use types::{
    BulkItem, BulkItemError, BulkItemStatus, BulkResponse, EngineInfo, RefreshPolicy,
    RequestParams,
};
