//! Runtime configuration.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{LogFormat, Settings, DEFAULT_OPENSEARCH_URL};
