//! Document identity types.
//!
//! A `DocumentIdentity` addresses a document in the remote index without
//! carrying its payload. Identities are built transiently whenever a lazy
//! attribute is resolved or a bulk header is written.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::CoercionError;

/// Canonical header key for the document id.
pub const ID_KEY: &str = "_id";
/// Canonical header key for the document type.
pub const TYPE_KEY: &str = "_type";
/// Canonical header key for the routing value.
pub const ROUTING_KEY: &str = "routing";

const ID_ALIASES: [&str; 2] = ["_id", "id"];
const TYPE_ALIASES: [&str; 2] = ["_type", "type"];
const ROUTING_ALIASES: [&str; 2] = ["routing", "_routing"];

/// Scalar document id, either numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    /// Integer id.
    Integer(i64),
    /// String id.
    String(String),
}

impl DocumentId {
    /// Interpret a JSON scalar as an id.
    ///
    /// `null` yields `Ok(None)`: the value is well formed but addresses nothing.
    pub fn from_value(value: &Value) -> Result<Option<Self>, CoercionError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Self::String(s.clone()))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Some(Self::Integer(i)))
                } else if let Some(u) = n.as_u64() {
                    Ok(Some(Self::String(u.to_string())))
                } else {
                    Err(CoercionError::invalid_id(format!(
                        "non-integer number {}",
                        n
                    )))
                }
            }
            other => Err(CoercionError::invalid_id(other.to_string())),
        }
    }

    /// Convert the id back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::String(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self::Integer(id)
    }
}

impl From<i32> for DocumentId {
    fn from(id: i32) -> Self {
        Self::Integer(i64::from(id))
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        i64::try_from(id)
            .map(Self::Integer)
            .unwrap_or_else(|_| Self::String(id.to_string()))
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self::String(id.to_string())
    }
}

/// Minimal `(id, type, routing)` triple used to address a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocumentIdentity {
    /// Document id. An identity without id is never sent to the index.
    pub id: Option<DocumentId>,
    /// Document (mapping) type.
    pub doc_type: Option<String>,
    /// Shard routing value.
    pub routing: Option<String>,
}

impl DocumentIdentity {
    /// Create an identity for the given id.
    pub fn new(id: impl Into<DocumentId>) -> Self {
        Self {
            id: Some(id.into()),
            doc_type: None,
            routing: None,
        }
    }

    /// Set the document type.
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Set the routing value.
    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// An identity is valid only if it carries an id.
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the document must be skipped by index/create/update operations.
    pub fn ignore_on_index(&self) -> bool {
        !self.is_valid()
    }

    /// Whether the document must be skipped by delete operations.
    pub fn ignore_on_delete(&self) -> bool {
        !self.is_valid()
    }

    /// Render the identity as a header map using the canonical keys.
    ///
    /// Absent fields are omitted.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(id) = &self.id {
            map.insert(ID_KEY.to_string(), id.to_value());
        }
        if let Some(doc_type) = &self.doc_type {
            map.insert(TYPE_KEY.to_string(), Value::from(doc_type.as_str()));
        }
        if let Some(routing) = &self.routing {
            map.insert(ROUTING_KEY.to_string(), Value::from(routing.as_str()));
        }
        map
    }

    /// Build an identity from a map with aliasable keys.
    ///
    /// Accepts `id`/`_id`, `type`/`_type` and `routing`/`_routing`. The
    /// underscored form wins for ids and types, the bare form for routing.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, CoercionError> {
        let id = match first_present(map, &ID_ALIASES) {
            Some(value) => DocumentId::from_value(value)?,
            None => None,
        };
        let doc_type = string_field(map, &TYPE_ALIASES, "type")?;
        let routing = string_field(map, &ROUTING_ALIASES, "routing")?;

        Ok(Self {
            id,
            doc_type,
            routing,
        })
    }

    /// Build an identity from an arbitrary JSON value.
    ///
    /// Objects go through [`DocumentIdentity::from_map`]; scalars are treated
    /// as the id.
    pub fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Null | Value::String(_) | Value::Number(_) => Ok(Self {
                id: DocumentId::from_value(value)?,
                ..Default::default()
            }),
            other => Err(CoercionError::unsupported(other.to_string())),
        }
    }
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

fn string_field(
    map: &Map<String, Value>,
    keys: &[&str],
    field: &'static str,
) -> Result<Option<String>, CoercionError> {
    match first_present(map, keys) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(CoercionError::invalid_field(field, other.to_string())),
    }
}

/// Coercion of identity-like input into a [`DocumentIdentity`].
///
/// Implemented for identities, documents, scalar ids and JSON values. This
/// is the closed set of inputs accepted wherever an identity is expected.
pub trait IntoIdentity {
    /// Perform the coercion.
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError>;
}

impl IntoIdentity for DocumentIdentity {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(self)
    }
}

impl IntoIdentity for &DocumentIdentity {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(self.clone())
    }
}

impl IntoIdentity for DocumentId {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(DocumentIdentity::new(self))
    }
}

impl IntoIdentity for i64 {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(DocumentIdentity::new(self))
    }
}

impl IntoIdentity for i32 {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(DocumentIdentity::new(self))
    }
}

impl IntoIdentity for &str {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(DocumentIdentity::new(self))
    }
}

impl IntoIdentity for String {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(DocumentIdentity::new(self))
    }
}

impl IntoIdentity for Uuid {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        Ok(DocumentIdentity::new(self))
    }
}

impl IntoIdentity for Value {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        DocumentIdentity::from_value(&self)
    }
}

impl IntoIdentity for &Value {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        DocumentIdentity::from_value(self)
    }
}

impl IntoIdentity for &Map<String, Value> {
    fn into_identity(self) -> Result<DocumentIdentity, CoercionError> {
        DocumentIdentity::from_map(self)
    }
}
