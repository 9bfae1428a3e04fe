//! Raw errors reported by a search engine implementation.

use serde_json::Value;
use thiserror::Error;

/// Error as reported by the underlying engine client, before coercion.
///
/// `status` is `None` for failures that never produced an HTTP response
/// (connection refused, timeouts, TLS failures).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason} (status: {status:?}, type: {error_type:?})")]
pub struct EngineError {
    /// HTTP status code of the failed response.
    pub status: Option<u16>,
    /// Engine error type, e.g. `index_not_found_exception`.
    pub error_type: Option<String>,
    /// Human readable reason.
    pub reason: String,
}

impl EngineError {
    /// Create an error for a response with the given status.
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            error_type: None,
            reason: reason.into(),
        }
    }

    /// Create an error for a failure that produced no response.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            error_type: None,
            reason: reason.into(),
        }
    }

    /// Set the engine error type.
    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    /// Build an error from a failed response body.
    ///
    /// Understands both the structured `{"error": {"type", "reason"}}` shape
    /// and the plain `{"error": "..."}` shape.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let error = body.get("error");
        let error_type = error
            .and_then(|e| e.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let reason = error
            .and_then(|e| e.get("reason").and_then(Value::as_str).or_else(|| e.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());

        Self {
            status: Some(status),
            error_type,
            reason,
        }
    }

    /// Whether the engine reported that the target already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self.error_type.as_deref(),
            Some("resource_already_exists_exception") | Some("index_already_exists_exception")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_structured_response() {
        let body = json!({
            "error": {
                "type": "resource_already_exists_exception",
                "reason": "index [users/abc] already exists"
            },
            "status": 400
        });

        let err = EngineError::from_response(400, &body);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.reason, "index [users/abc] already exists");
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_from_plain_response() {
        let err = EngineError::from_response(500, &json!({ "error": "boom" }));
        assert_eq!(err.reason, "boom");
        assert!(err.error_type.is_none());

        let err = EngineError::from_response(502, &json!("bad gateway"));
        assert_eq!(err.reason, "\"bad gateway\"");
    }
}
