//! Serializer for JSON object records.

use index_sync_pipeline::{Context, DocumentSerializer, PipelineError};
use index_sync_shared::{Document, DocumentId, DocumentIdentity};
use serde_json::Value;

use super::Record;

/// Field read as the document id when none is configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Keys the engine reserves for document metadata.
const METADATA_KEYS: [&str; 3] = ["_id", "_type", "_routing"];

/// Turns a JSON record into a document.
///
/// The id is read from `id_field`; a missing or `null` id yields a document
/// that is counted but never sent. Metadata keys are stripped from the
/// source. A context entry `skip` holding an array of ids drops the
/// matching records.
#[derive(Debug, Clone)]
pub struct JsonRecordSerializer {
    id_field: String,
    routing_field: Option<String>,
}

impl Default for JsonRecordSerializer {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

impl JsonRecordSerializer {
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            routing_field: None,
        }
    }

    /// Read the shard routing value from `field`.
    pub fn with_routing_field(mut self, field: impl Into<String>) -> Self {
        self.routing_field = Some(field.into());
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    fn identity(&self, record: &Record) -> Result<DocumentIdentity, PipelineError> {
        let id = match record.get(&self.id_field) {
            Some(value) => DocumentId::from_value(value)?,
            None => None,
        };
        let routing = self
            .routing_field
            .as_ref()
            .and_then(|field| record.get(field))
            .and_then(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        Ok(DocumentIdentity {
            id,
            doc_type: None,
            routing,
        })
    }
}

impl DocumentSerializer<Record> for JsonRecordSerializer {
    fn serialize(&self, record: &Record, context: &Context) -> Result<Option<Document>, PipelineError> {
        let identity = self.identity(record)?;

        let skipped = match (context.get("skip"), &identity.id) {
            (Some(Value::Array(skip)), Some(id)) => skip.contains(&id.to_value()),
            _ => false,
        };
        if skipped {
            return Ok(None);
        }

        let mut source = record.clone();
        for key in METADATA_KEYS {
            source.remove(key);
        }
        Ok(Some(Document::with_identity(identity, source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_sync_shared::CoercionError;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_id_and_routing() {
        let serializer = JsonRecordSerializer::default().with_routing_field("tenant");
        let doc = serializer
            .serialize(
                &record(json!({ "id": 7, "tenant": 3, "name": "Ada" })),
                &Context::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(doc.id(), Some(&DocumentId::Integer(7)));
        assert_eq!(doc.routing(), Some("3"));
        assert_eq!(doc.source()["name"], json!("Ada"));
        assert_eq!(doc.source()["id"], json!(7));
    }

    #[test]
    fn test_custom_id_field_strips_metadata() {
        let serializer = JsonRecordSerializer::new("_id");
        let doc = serializer
            .serialize(
                &record(json!({ "_id": "u-1", "_type": "user", "name": "Ada" })),
                &Context::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(doc.id(), Some(&DocumentId::String("u-1".to_string())));
        assert!(!doc.source().contains_key("_id"));
        assert!(!doc.source().contains_key("_type"));
    }

    #[test]
    fn test_missing_or_null_id_is_invalid() {
        let serializer = JsonRecordSerializer::default();
        for value in [json!({ "name": "a" }), json!({ "id": null, "name": "b" })] {
            let doc = serializer
                .serialize(&record(value), &Context::new())
                .unwrap()
                .unwrap();
            assert!(!doc.is_valid());
        }
    }

    #[test]
    fn test_unsupported_id_fails() {
        let serializer = JsonRecordSerializer::default();
        let err = serializer
            .serialize(&record(json!({ "id": [1] })), &Context::new())
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Coercion(CoercionError::InvalidId(_))
        ));
    }

    #[test]
    fn test_context_skip_list() {
        let serializer = JsonRecordSerializer::default();
        let mut context = Context::new();
        context.insert("skip".to_string(), json!([2]));

        let kept = serializer
            .serialize(&record(json!({ "id": 1 })), &context)
            .unwrap();
        let skipped = serializer
            .serialize(&record(json!({ "id": 2 })), &context)
            .unwrap();

        assert!(kept.is_some());
        assert!(skipped.is_none());
    }
}
