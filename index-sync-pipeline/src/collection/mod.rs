//! Collection module for the synchronization pipeline.
//!
//! A collection is the application-supplied source of records. The pipeline
//! pulls batches from it and never looks inside a record itself; that is the
//! serializer's job.

mod vec_collection;

pub use vec_collection::{VecCollection, DEFAULT_BATCH_SIZE};

use futures::stream::BoxStream;
use serde_json::{Map, Value};

use crate::errors::PipelineError;

/// Free-form context threaded from `import` down to every serializer call.
pub type Context = Map<String, Value>;

/// One batch of raw records, plus the context it should be serialized with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch<R> {
    pub records: Vec<R>,
    pub context: Context,
}

impl<R> RecordBatch<R> {
    pub fn new(records: Vec<R>, context: Context) -> Self {
        Self { records, context }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Pull-based, batch-producing source of application records.
///
/// Every call to [`Collection::batches`] starts a fresh, finite pass over the
/// data. A collection with no data returns an empty stream.
pub trait Collection<R>: Send + Sync {
    fn batches<'a>(
        &'a self,
        context: &'a Context,
    ) -> BoxStream<'a, Result<RecordBatch<R>, PipelineError>>;
}
