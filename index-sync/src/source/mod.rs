//! Newline-delimited JSON input.
//!
//! Each line of a file is one record: a JSON object that is turned into a
//! document by [`JsonRecordSerializer`].

mod json_lines;
mod serializer;

pub use json_lines::JsonLinesCollection;
pub use serializer::{JsonRecordSerializer, DEFAULT_ID_FIELD};

use serde_json::{Map, Value};

/// One input record.
pub type Record = Map<String, Value>;
