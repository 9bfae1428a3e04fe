//! In-memory collection.

use futures::stream::{self, BoxStream, StreamExt};

use super::{Collection, Context, RecordBatch};
use crate::errors::PipelineError;

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Collection over records held in memory, cut into fixed-size batches.
#[derive(Debug, Clone)]
pub struct VecCollection<R> {
    records: Vec<R>,
    batch_size: usize,
}

impl<R> VecCollection<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size. A size of zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R> Collection<R> for VecCollection<R>
where
    R: Clone + Send + Sync,
{
    fn batches<'a>(
        &'a self,
        context: &'a Context,
    ) -> BoxStream<'a, Result<RecordBatch<R>, PipelineError>> {
        stream::iter(
            self.records
                .chunks(self.batch_size)
                .map(move |chunk| Ok(RecordBatch::new(chunk.to_vec(), context.clone()))),
        )
        .boxed()
    }
}
