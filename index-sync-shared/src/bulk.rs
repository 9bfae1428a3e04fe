//! Bulk request bodies.
//!
//! The builder turns tagged document lists into one or more request bodies
//! compatible with the remote `_bulk` API, each kept under a byte budget so
//! the caller can issue several physical requests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::document::Document;
use crate::identity::TYPE_KEY;

/// Bulk action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Index,
    Create,
    Update,
    Delete,
}

impl BulkAction {
    /// Action name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count of emitted operations per action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkStats(BTreeMap<BulkAction, usize>);

impl BulkStats {
    /// Number of operations recorded for `action`.
    pub fn get(&self, action: BulkAction) -> usize {
        self.0.get(&action).copied().unwrap_or(0)
    }

    /// Number of operations across all actions.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Add one operation for `action`.
    pub fn record(&mut self, action: BulkAction) {
        *self.0.entry(action).or_insert(0) += 1;
    }

    /// Fold another set of counters into this one.
    pub fn absorb(&mut self, other: &BulkStats) {
        for (action, count) in &other.0 {
            *self.0.entry(*action).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BulkAction, usize)> + '_ {
        self.0.iter().map(|(action, count)| (*action, *count))
    }
}

/// One `(action, header, data)` entry of a bulk body.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOperation {
    action: BulkAction,
    header: Map<String, Value>,
    data: Option<Value>,
    encoded_len: usize,
}

impl BulkOperation {
    fn new(action: BulkAction, header: Map<String, Value>, data: Option<Value>) -> Self {
        let mut op = Self {
            action,
            header,
            data,
            encoded_len: 0,
        };
        op.encoded_len = op.encode().len();
        op
    }

    pub fn action(&self) -> BulkAction {
        self.action
    }

    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// Data line; `None` for deletes.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Size of the NDJSON fragment for this operation, newlines included.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    fn without_type(mut self) -> Self {
        if self.header.remove(TYPE_KEY).is_some() {
            self.encoded_len = self.encode().len();
        }
        self
    }

    fn action_line(&self) -> Value {
        let mut line = Map::with_capacity(1);
        line.insert(
            self.action.as_str().to_string(),
            Value::Object(self.header.clone()),
        );
        Value::Object(line)
    }

    fn encode(&self) -> String {
        let mut out = self.action_line().to_string();
        out.push('\n');
        if let Some(data) = &self.data {
            out.push_str(&data.to_string());
            out.push('\n');
        }
        out
    }
}

/// A single physical bulk request.
///
/// Built once by [`BulkRequestBuilder`] and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRequestBody {
    operations: Vec<BulkOperation>,
    stats: BulkStats,
    byte_size: usize,
}

impl BulkRequestBody {
    fn push(&mut self, operation: BulkOperation) {
        self.stats.record(operation.action);
        self.byte_size += operation.encoded_len;
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    pub fn stats(&self) -> &BulkStats {
        &self.stats
    }

    /// Encoded NDJSON size in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Action and data lines in order, one JSON value per line.
    pub fn lines(&self) -> Vec<Value> {
        let mut lines = Vec::with_capacity(self.operations.len() * 2);
        for op in &self.operations {
            lines.push(op.action_line());
            if let Some(data) = &op.data {
                lines.push(data.clone());
            }
        }
        lines
    }

    /// Newline-delimited wire payload.
    pub fn to_ndjson(&self) -> String {
        let mut out = String::with_capacity(self.byte_size);
        for op in &self.operations {
            out.push_str(&op.encode());
        }
        out
    }
}

/// Accumulates index/create/update/delete operations into size-bounded bodies.
///
/// Documents whose identity cannot address a remote document are skipped
/// silently. Operations are emitted in delete, create, index, update order.
#[derive(Debug, Clone)]
pub struct BulkRequestBuilder {
    max_body_bytes: Option<usize>,
    include_type: bool,
    deletes: Vec<BulkOperation>,
    creates: Vec<BulkOperation>,
    indexes: Vec<BulkOperation>,
    updates: Vec<BulkOperation>,
}

impl Default for BulkRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkRequestBuilder {
    /// Create a builder with no size limit that keeps `_type` in headers.
    pub fn new() -> Self {
        Self {
            max_body_bytes: None,
            include_type: true,
            deletes: Vec::new(),
            creates: Vec::new(),
            indexes: Vec::new(),
            updates: Vec::new(),
        }
    }

    /// Split bodies so that each stays within `bytes`.
    ///
    /// A single operation larger than the budget still gets its own body.
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = Some(bytes);
        self
    }

    /// Whether headers carry the `_type` key. Applied when the bodies are built.
    pub fn include_type(mut self, include: bool) -> Self {
        self.include_type = include;
        self
    }

    pub fn index<'a>(mut self, documents: impl IntoIterator<Item = &'a Document>) -> Self {
        for doc in documents.into_iter().filter(|d| !d.ignore_on_index()) {
            let op = self.operation(BulkAction::Index, doc);
            self.indexes.push(op);
        }
        self
    }

    pub fn create<'a>(mut self, documents: impl IntoIterator<Item = &'a Document>) -> Self {
        for doc in documents.into_iter().filter(|d| !d.ignore_on_index()) {
            let op = self.operation(BulkAction::Create, doc);
            self.creates.push(op);
        }
        self
    }

    /// Partial updates: the data line is always `{"doc": ...}`.
    pub fn update<'a>(mut self, documents: impl IntoIterator<Item = &'a Document>) -> Self {
        for doc in documents.into_iter().filter(|d| !d.ignore_on_index()) {
            let op = self.operation(BulkAction::Update, doc);
            self.updates.push(op);
        }
        self
    }

    pub fn delete<'a>(mut self, documents: impl IntoIterator<Item = &'a Document>) -> Self {
        for doc in documents.into_iter().filter(|d| !d.ignore_on_delete()) {
            let op = self.operation(BulkAction::Delete, doc);
            self.deletes.push(op);
        }
        self
    }

    fn operation(&self, action: BulkAction, doc: &Document) -> BulkOperation {
        let header = doc.header();

        let data = match action {
            BulkAction::Index | BulkAction::Create => {
                Some(Value::Object(doc.mutated_source().clone()))
            }
            BulkAction::Update => Some(json!({ "doc": doc.mutated_source() })),
            BulkAction::Delete => None,
        };

        BulkOperation::new(action, header, data)
    }

    /// Stats over every operation collected so far.
    pub fn stats(&self) -> BulkStats {
        let mut stats = BulkStats::default();
        for op in self
            .deletes
            .iter()
            .chain(&self.creates)
            .chain(&self.indexes)
            .chain(&self.updates)
        {
            stats.record(op.action);
        }
        stats
    }

    /// Group the collected operations into request bodies.
    ///
    /// Returns an empty vector when there is nothing to send.
    pub fn build(self) -> Vec<BulkRequestBody> {
        let mut bodies = Vec::new();
        let mut current = BulkRequestBody::default();
        let include_type = self.include_type;

        let operations = self
            .deletes
            .into_iter()
            .chain(self.creates)
            .chain(self.indexes)
            .chain(self.updates);

        for op in operations {
            let op = if include_type { op } else { op.without_type() };
            if let Some(max) = self.max_body_bytes {
                if !current.is_empty() && current.byte_size + op.encoded_len > max {
                    bodies.push(std::mem::take(&mut current));
                }
            }
            current.push(op);
        }

        if !current.is_empty() {
            bodies.push(current);
        }
        bodies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::DocumentIdentity;

    fn doc(id: i64, name: &str) -> Document {
        let mut source = Map::new();
        source.insert("name".to_string(), json!(name));
        Document::new(id, source)
    }

    fn invalid_doc() -> Document {
        Document::with_identity(DocumentIdentity::default(), Map::new())
    }

    #[test]
    fn test_index_stats_exclude_invalid_identities() {
        let docs = vec![doc(1, "a"), invalid_doc(), doc(2, "b"), doc(3, "c")];

        let bodies = BulkRequestBuilder::new().index(&docs).build();

        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].stats().get(BulkAction::Index), 3);
        assert_eq!(bodies[0].stats().total(), 3);
    }

    #[test]
    fn test_action_shapes() {
        let mut updated = doc(2, "b");
        updated.mutate("tags", json!(["x"]));
        let indexed = vec![doc(1, "a")];
        let updates = vec![updated];
        let deletes = vec![doc(3, "c")];

        let bodies = BulkRequestBuilder::new()
            .index(&indexed)
            .update(&updates)
            .delete(&deletes)
            .build();
        let lines = bodies[0].lines();

        // delete comes first and has no data line
        assert_eq!(lines[0], json!({ "delete": { "_id": 3 } }));
        assert_eq!(lines[1], json!({ "index": { "_id": 1 } }));
        assert_eq!(lines[2], json!({ "name": "a" }));
        assert_eq!(lines[3], json!({ "update": { "_id": 2 } }));
        assert_eq!(lines[4], json!({ "doc": { "name": "b", "tags": ["x"] } }));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_ndjson_rendering() {
        let docs = vec![doc(1, "a")];
        let body = BulkRequestBuilder::new().create(&docs).build().remove(0);

        let ndjson = body.to_ndjson();
        assert_eq!(ndjson, "{\"create\":{\"_id\":1}}\n{\"name\":\"a\"}\n");
        assert_eq!(body.byte_size(), ndjson.len());
    }

    #[test]
    fn test_type_can_be_dropped_from_headers() {
        let docs = vec![doc(1, "a").with_type("user").with_routing("r")];

        let with_type = BulkRequestBuilder::new().index(&docs).build();
        assert_eq!(
            with_type[0].operations()[0].header().get("_type"),
            Some(&json!("user"))
        );

        let without_type = BulkRequestBuilder::new()
            .include_type(false)
            .index(&docs)
            .build();
        let header = without_type[0].operations()[0].header();
        assert!(header.get("_type").is_none());
        assert_eq!(header.get("routing"), Some(&json!("r")));
    }

    #[test]
    fn test_type_dropped_after_documents_are_collected() {
        let docs = vec![doc(1, "a").with_type("user"), doc(2, "b").with_type("user")];

        let bodies = BulkRequestBuilder::new()
            .index(&docs)
            .update(&docs)
            .include_type(false)
            .build();

        assert_eq!(bodies.len(), 1);
        assert!(bodies[0]
            .operations()
            .iter()
            .all(|op| op.header().get("_type").is_none()));
        let expected = bodies[0].to_ndjson().len();
        assert_eq!(bodies[0].byte_size(), expected);
    }

    #[test]
    fn test_bodies_split_under_byte_budget() {
        let docs: Vec<Document> = (1..=10).map(|i| doc(i, "some name")).collect();
        let single = BulkRequestBuilder::new().index(&docs[..1]).build();
        let op_len = single[0].byte_size();

        let bodies = BulkRequestBuilder::new()
            .max_body_bytes(op_len * 3)
            .index(&docs)
            .build();

        assert_eq!(bodies.len(), 4);
        assert!(bodies.iter().all(|b| b.byte_size() <= op_len * 3));
        let total: usize = bodies.iter().map(|b| b.stats().get(BulkAction::Index)).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_oversized_operation_gets_its_own_body() {
        let docs = vec![doc(1, "a"), doc(2, "b")];
        let bodies = BulkRequestBuilder::new()
            .max_body_bytes(1)
            .index(&docs)
            .build();
        assert_eq!(bodies.len(), 2);
    }

    #[test]
    fn test_empty_builder_produces_no_bodies() {
        let invalid = vec![invalid_doc()];
        assert!(BulkRequestBuilder::new().build().is_empty());
        assert!(BulkRequestBuilder::new().delete(&invalid).build().is_empty());
    }

    #[test]
    fn test_stats_absorb() {
        let mut a = BulkStats::default();
        a.record(BulkAction::Index);
        let mut b = BulkStats::default();
        b.record(BulkAction::Index);
        b.record(BulkAction::Update);

        a.absorb(&b);
        assert_eq!(a.get(BulkAction::Index), 2);
        assert_eq!(a.get(BulkAction::Update), 1);
        assert_eq!(a.get(BulkAction::Delete), 0);
    }
}
