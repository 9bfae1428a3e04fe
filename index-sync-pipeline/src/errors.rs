//! Error types for the synchronization pipeline.

use index_sync_repository::TransportError;
use index_sync_shared::CoercionError;
use thiserror::Error;

/// Errors that can occur while serializing, resolving or shipping documents.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or conflicting registration (serializer, collection,
    /// repository, lazy attribute).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed identity input.
    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// Error from the transport, already coerced.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error raised by a collection while producing batches.
    #[error("Collection error: {0}")]
    Collection(String),

    /// Error raised by a serializer.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error raised by a lazy attribute computation.
    #[error("Lazy attribute '{name}' failed: {reason}")]
    LazyAttribute { name: String, reason: String },
}

impl PipelineError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a collection error.
    pub fn collection(msg: impl Into<String>) -> Self {
        Self::Collection(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a lazy attribute error.
    pub fn lazy_attribute(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LazyAttribute {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
