//! Transport error taxonomy.
//!
//! Every engine failure is coerced into one of these variants exactly once,
//! at the transport boundary.

use thiserror::Error;

use super::EngineError;

/// Errors surfaced by transport operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// A mutating operation was attempted against a readonly cluster.
    #[error("Cluster {cluster} is readonly, refusing {operation}")]
    ReadonlyCluster {
        cluster: String,
        operation: &'static str,
    },

    /// The target index or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The engine rejected the request as malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Version conflict or similar concurrent modification.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request body exceeded the engine's size limit.
    #[error("Request entity too large: {0}")]
    RequestEntityTooLarge(String),

    /// Any other failed response.
    #[error("Server error ({status}): {reason}")]
    ServerError { status: u16, reason: String },

    /// Engine failure without a response; passed through unchanged.
    #[error("Engine error: {0}")]
    Engine(EngineError),

    /// The engine answered with a body that could not be interpreted.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A single-document operation was given an identity without id.
    #[error("Document without id cannot be used for {0}")]
    MissingId(&'static str),
}

impl TransportError {
    /// Create a readonly cluster error.
    pub fn readonly(cluster: impl Into<String>, operation: &'static str) -> Self {
        Self::ReadonlyCluster {
            cluster: cluster.into(),
            operation,
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Conflict(_) => Some(409),
            Self::RequestEntityTooLarge(_) => Some(413),
            Self::ServerError { status, .. } => Some(*status),
            Self::Engine(err) => err.status,
            Self::ReadonlyCluster { .. } | Self::Serialization(_) | Self::MissingId(_) => None,
        }
    }
}

impl From<EngineError> for TransportError {
    fn from(err: EngineError) -> Self {
        match err.status {
            Some(404) => Self::NotFound(err.reason),
            Some(400) => Self::BadRequest(err.reason),
            Some(409) => Self::Conflict(err.reason),
            Some(413) => Self::RequestEntityTooLarge(err.reason),
            Some(status) => Self::ServerError {
                status,
                reason: err.reason,
            },
            None => Self::Engine(err),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_coercion() {
        let cases = [
            (404, 404),
            (400, 400),
            (409, 409),
            (413, 413),
            (500, 500),
            (503, 503),
            (429, 429),
        ];

        for (status, expected) in cases {
            let err = TransportError::from(EngineError::new(status, "x"));
            assert_eq!(err.status(), Some(expected));
        }

        assert!(matches!(
            TransportError::from(EngineError::new(404, "missing")),
            TransportError::NotFound(reason) if reason == "missing"
        ));
        assert!(matches!(
            TransportError::from(EngineError::new(503, "unavailable")),
            TransportError::ServerError { status: 503, .. }
        ));
    }

    #[test]
    fn test_connection_errors_pass_through() {
        let raw = EngineError::connection("connection refused");
        let err = TransportError::from(raw.clone());
        assert_eq!(err, TransportError::Engine(raw));
        assert_eq!(err.status(), None);
    }
}
