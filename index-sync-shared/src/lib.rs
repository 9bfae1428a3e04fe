//! # Index Sync Shared
//!
//! Shared data model for the index synchronizer: document identities,
//! in-memory documents and the bulk request bodies built from them.
//!
//! Nothing in this crate performs I/O.

pub mod bulk;
pub mod document;
pub mod errors;
pub mod identity;

pub use bulk::{BulkAction, BulkOperation, BulkRequestBody, BulkRequestBuilder, BulkStats};
pub use document::Document;
pub use errors::CoercionError;
pub use identity::{DocumentId, DocumentIdentity, IntoIdentity};
