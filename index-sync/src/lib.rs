//! # Index Sync
//!
//! Entry point and configuration for the index synchronizer.
//!
//! This crate wires the OpenSearch engine, the cluster registry and the
//! synchronization pipeline together, and provides a newline-delimited JSON
//! source so files can be imported from the command line.

pub mod commands;
pub mod config;
pub mod source;
pub mod telemetry;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during startup or while running a command.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] index_sync_pipeline::PipelineError),

    /// Transport error.
    #[error("Transport error: {0}")]
    TransportError(#[from] index_sync_repository::TransportError),

    /// Engine error.
    #[error("Engine error: {0}")]
    EngineError(#[from] index_sync_repository::EngineError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
