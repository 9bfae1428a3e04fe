//! Error types for the shared document model.

use thiserror::Error;

/// Errors raised while coercing loosely-typed input into identities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// The id value has a shape that cannot address a document.
    #[error("Invalid document id: {0}")]
    InvalidId(String),

    /// A type or routing value is not a string.
    #[error("Invalid {field} value: {value}")]
    InvalidField { field: &'static str, value: String },

    /// The input cannot be interpreted as an identity at all.
    #[error("Cannot coerce {0} into a document identity")]
    Unsupported(String),
}

impl CoercionError {
    /// Create an invalid id error.
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }

    /// Create an unsupported input error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}
