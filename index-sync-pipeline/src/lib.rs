//! # Index Sync Pipeline
//!
//! This crate provides the synchronization pipeline: it pulls application
//! records from collections, serializes them into documents, resolves lazy
//! attributes and ships everything to the search engine in bulk.
//!
//! ## Architecture
//!
//! 1. **Collection**: yields batches of raw records
//! 2. **Repository**: serializes records and resolves lazy attributes
//! 3. **Loader**: builds and paces bulk requests
//! 4. **Index**: drives imports and index management for its repositories

pub mod collection;
pub mod errors;
pub mod index;
pub mod loader;
pub mod repository;
pub mod serializer;

pub use collection::{Collection, Context, RecordBatch, VecCollection, DEFAULT_BATCH_SIZE};
pub use errors::PipelineError;
pub use index::{AttributeSelector, BulkOptions, ImportOptions, Index, IndexBuilder};
pub use loader::{BulkLoader, BulkSummary, BulkThrottle};
pub use repository::{
    IndexRepository, LazyAttribute, LazyAttributeFn, LazyAttributeOptions, LazyAttributeValues,
    Repository, RepositoryBuilder,
};
pub use serializer::{DocumentSerializer, Serializer};
