//! Record serializers.
//!
//! A serializer turns one application record into an index [`Document`], or
//! vetoes the record by returning `None`. Serializers can be registered as a
//! closure, as an object, or as a type built through `Default`; all three are
//! normalized into one trait object at registration time.

use std::fmt;
use std::sync::Arc;

use index_sync_shared::Document;

use crate::collection::Context;
use crate::errors::PipelineError;

/// Converts application records into index documents.
pub trait DocumentSerializer<R>: Send + Sync {
    /// Serialize `record`. `Ok(None)` drops the record from the batch.
    fn serialize(&self, record: &R, context: &Context) -> Result<Option<Document>, PipelineError>;
}

type SerializeFn<R> =
    dyn Fn(&R, &Context) -> Result<Option<Document>, PipelineError> + Send + Sync;

/// The ways a serializer can be registered on a repository.
pub enum Serializer<R> {
    /// Plain function or closure.
    Closure(Box<SerializeFn<R>>),
    /// Ready-made serializer object.
    Object(Arc<dyn DocumentSerializer<R>>),
    /// Serializer type, instantiated once through its constructor.
    Type(fn() -> Arc<dyn DocumentSerializer<R>>),
}

impl<R: 'static> Serializer<R> {
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&R, &Context) -> Result<Option<Document>, PipelineError> + Send + Sync + 'static,
    {
        Self::Closure(Box::new(f))
    }

    pub fn object(serializer: impl DocumentSerializer<R> + 'static) -> Self {
        Self::Object(Arc::new(serializer))
    }

    pub fn of_type<S>() -> Self
    where
        S: DocumentSerializer<R> + Default + 'static,
    {
        Self::Type(|| -> Arc<dyn DocumentSerializer<R>> { Arc::new(S::default()) })
    }

    /// Resolve to the single form the repository calls.
    pub fn normalize(self) -> Arc<dyn DocumentSerializer<R>> {
        match self {
            Self::Closure(f) => Arc::new(ClosureSerializer(f)),
            Self::Object(serializer) => serializer,
            Self::Type(construct) => construct(),
        }
    }
}

impl<R> fmt::Debug for Serializer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Closure(_) => "Closure",
            Self::Object(_) => "Object",
            Self::Type(_) => "Type",
        };
        f.debug_tuple("Serializer").field(&kind).finish()
    }
}

struct ClosureSerializer<R>(Box<SerializeFn<R>>);

impl<R> DocumentSerializer<R> for ClosureSerializer<R> {
    fn serialize(&self, record: &R, context: &Context) -> Result<Option<Document>, PipelineError> {
        (self.0)(record, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[derive(Default)]
    struct NameSerializer;

    impl DocumentSerializer<(i64, &'static str)> for NameSerializer {
        fn serialize(
            &self,
            record: &(i64, &'static str),
            _context: &Context,
        ) -> Result<Option<Document>, PipelineError> {
            let mut source = Map::new();
            source.insert("name".to_string(), json!(record.1));
            Ok(Some(Document::new(record.0, source)))
        }
    }

    #[test]
    fn test_all_kinds_normalize_to_the_same_behavior() {
        let record = (7, "seven");
        let context = Context::new();

        let kinds = vec![
            Serializer::closure(|r: &(i64, &'static str), _ctx: &Context| {
                let mut source = Map::new();
                source.insert("name".to_string(), json!(r.1));
                Ok(Some(Document::new(r.0, source)))
            }),
            Serializer::object(NameSerializer),
            Serializer::of_type::<NameSerializer>(),
        ];

        let documents: Vec<Document> = kinds
            .into_iter()
            .map(|kind| kind.normalize().serialize(&record, &context).unwrap().unwrap())
            .collect();

        assert!(documents.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(documents[0].source()["name"], json!("seven"));
    }

    #[test]
    fn test_closure_can_veto() {
        let serializer = Serializer::closure(|r: &i64, _ctx: &Context| {
            if *r < 0 {
                return Ok(None);
            }
            Ok(Some(Document::new(*r, Map::new())))
        })
        .normalize();

        assert!(serializer.serialize(&-1, &Context::new()).unwrap().is_none());
        assert!(serializer.serialize(&1, &Context::new()).unwrap().is_some());
    }
}
