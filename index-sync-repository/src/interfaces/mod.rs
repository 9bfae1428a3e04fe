//! Interface definitions for the search engine and the transport.
//!
//! `SearchEngine` is the low-level seam implemented by concrete clients
//! (OpenSearch, test doubles). The operation-group traits are the guarded,
//! instrumented surface implemented by [`crate::Transport`].

mod operations;
mod search_engine;

pub use operations::{AliasOperations, BulkOperations, BulkRequest, DocumentOperations, IndexOperations};
pub use search_engine::SearchEngine;
