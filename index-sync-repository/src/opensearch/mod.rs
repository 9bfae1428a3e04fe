//! OpenSearch implementation of the search engine.
//!
//! This module provides a concrete implementation of `SearchEngine`
//! using the OpenSearch Rust client.

mod engine;

pub use engine::OpenSearchEngine;
