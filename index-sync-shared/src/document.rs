//! In-memory representation of one record destined for the index.

use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::errors::CoercionError;
use crate::identity::{DocumentId, DocumentIdentity, IntoIdentity};

/// Keys stripped from a raw JSON object when it is turned into a document.
const RESERVED_SOURCE_KEYS: [&str; 3] = ["_id", "_type", "_routing"];

/// A serialized, addressable document.
///
/// `source` is the payload produced by the serializer and is never modified
/// after construction. Fields attached later (resolved lazy attributes) are
/// kept in a separate mutation map; [`Document::mutated_source`] exposes the
/// merge of both.
#[derive(Debug, Clone, Default)]
pub struct Document {
    identity: DocumentIdentity,
    meta: Map<String, Value>,
    source: Map<String, Value>,
    mutations: Map<String, Value>,
    mutated: OnceLock<Map<String, Value>>,
}

impl Document {
    /// Create a document with the given id and source payload.
    pub fn new(id: impl Into<DocumentId>, source: Map<String, Value>) -> Self {
        Self::with_identity(DocumentIdentity::new(id), source)
    }

    /// Create a document for an explicit identity.
    pub fn with_identity(identity: DocumentIdentity, source: Map<String, Value>) -> Self {
        Self {
            identity,
            source,
            ..Default::default()
        }
    }

    /// Build a document from a raw JSON object.
    ///
    /// The identity is read from the aliased id/type/routing keys and the
    /// underscored keys are removed from the source.
    pub fn from_json(mut object: Map<String, Value>) -> Result<Self, CoercionError> {
        let identity = DocumentIdentity::from_map(&object)?;
        for key in RESERVED_SOURCE_KEYS {
            object.remove(key);
        }
        Ok(Self::with_identity(identity, object))
    }

    /// Set the document type.
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.identity.doc_type = Some(doc_type.into());
        self
    }

    /// Set the routing value.
    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.identity.routing = Some(routing.into());
        self
    }

    /// Attach a per-operation request parameter (e.g. `version`).
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Fill in the document type unless the serializer already chose one.
    pub fn ensure_type(&mut self, doc_type: &str) {
        if self.identity.doc_type.is_none() {
            self.identity.doc_type = Some(doc_type.to_string());
        }
    }

    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.identity.id.as_ref()
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.identity.doc_type.as_deref()
    }

    pub fn routing(&self) -> Option<&str> {
        self.identity.routing.as_deref()
    }

    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// The original, unmutated payload.
    pub fn source(&self) -> &Map<String, Value> {
        &self.source
    }

    pub fn mutations(&self) -> &Map<String, Value> {
        &self.mutations
    }

    /// Whether the document can be addressed in the remote index.
    pub fn is_valid(&self) -> bool {
        self.identity.is_valid()
    }

    pub fn ignore_on_index(&self) -> bool {
        self.identity.ignore_on_index()
    }

    pub fn ignore_on_delete(&self) -> bool {
        self.identity.ignore_on_delete()
    }

    /// Record a field on top of the source and drop the cached merge.
    pub fn mutate(&mut self, key: impl Into<String>, value: Value) {
        self.mutations.insert(key.into(), value);
        self.mutated.take();
    }

    /// Record every field of `partial` as a mutation.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        if partial.is_empty() {
            return;
        }
        for (key, value) in partial {
            self.mutations.insert(key.clone(), value.clone());
        }
        self.mutated.take();
    }

    /// Source merged with mutations, computed on first access.
    pub fn mutated_source(&self) -> &Map<String, Value> {
        if self.mutations.is_empty() {
            return &self.source;
        }
        self.mutated.get_or_init(|| {
            let mut merged = self.source.clone();
            for (key, value) in &self.mutations {
                merged.insert(key.clone(), value.clone());
            }
            merged
        })
    }

    /// Bulk action header: identity keys followed by request parameters.
    ///
    /// Meta entries never override the identity keys.
    pub fn header(&self) -> Map<String, Value> {
        let mut header = self.identity.to_map();
        for (key, value) in &self.meta {
            header.entry(key.clone()).or_insert_with(|| value.clone());
        }
        header
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.meta == other.meta && self.source == other.source
    }
}

impl From<&Document> for DocumentIdentity {
    fn from(document: &Document) -> Self {
        document.identity.clone()
    }
}

impl IntoIdentity for Document {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(self.identity)
    }
}

impl IntoIdentity for &Document {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(self.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_mutation_leaves_source_untouched() {
        let mut doc = Document::new(1, source(json!({ "name": "Alice" })));
        doc.mutate("foo", json!("bar"));

        assert_eq!(doc.source(), &source(json!({ "name": "Alice" })));
        assert_eq!(
            doc.mutated_source(),
            &source(json!({ "name": "Alice", "foo": "bar" }))
        );
    }

    #[test]
    fn test_mutated_source_is_recomputed_after_new_mutation() {
        let mut doc = Document::new(1, source(json!({ "a": 1 })));
        doc.mutate("b", json!(2));
        assert_eq!(doc.mutated_source().get("b"), Some(&json!(2)));

        doc.merge(&source(json!({ "b": 3, "c": null })));
        assert_eq!(doc.mutated_source().get("b"), Some(&json!(3)));
        assert_eq!(doc.mutated_source().get("c"), Some(&Value::Null));
        assert_eq!(doc.source().len(), 1);
    }

    #[test]
    fn test_equality_ignores_mutations() {
        let a = Document::new(1, source(json!({ "a": 1 })));
        let mut b = a.clone();
        b.mutate("extra", json!(true));
        assert_eq!(a, b);

        let c = a.clone().with_meta("version", 2);
        assert_ne!(a, c);

        let d = a.clone().with_routing("r");
        assert_ne!(a, d);
    }

    #[test]
    fn test_header_merges_identity_and_meta() {
        let doc = Document::new("x", Map::new())
            .with_type("user")
            .with_routing("r1")
            .with_meta("version", 5)
            .with_meta("_id", "ignored");

        let header = doc.header();
        assert_eq!(header.get("_id"), Some(&json!("x")));
        assert_eq!(header.get("_type"), Some(&json!("user")));
        assert_eq!(header.get("routing"), Some(&json!("r1")));
        assert_eq!(header.get("version"), Some(&json!(5)));
    }

    #[test]
    fn test_from_json_strips_reserved_keys() {
        let doc = Document::from_json(source(json!({
            "_id": 10,
            "_routing": "r",
            "title": "Hello"
        })))
        .unwrap();

        assert_eq!(doc.id(), Some(&DocumentId::Integer(10)));
        assert_eq!(doc.routing(), Some("r"));
        assert_eq!(doc.source(), &source(json!({ "title": "Hello" })));
    }

    #[test]
    fn test_ensure_type_keeps_explicit_type() {
        let mut explicit = Document::new(1, Map::new()).with_type("admin");
        explicit.ensure_type("user");
        assert_eq!(explicit.doc_type(), Some("admin"));

        let mut implicit = Document::new(1, Map::new());
        implicit.ensure_type("user");
        assert_eq!(implicit.doc_type(), Some("user"));
    }
}
