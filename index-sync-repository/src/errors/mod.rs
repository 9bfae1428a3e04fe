//! Error types for the index sync repository.

mod engine_error;
mod transport_error;

pub use engine_error::EngineError;
pub use transport_error::TransportError;
