//! Collection over a newline-delimited JSON file.

use std::path::{Path, PathBuf};

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use index_sync_pipeline::{Collection, Context, PipelineError, RecordBatch, DEFAULT_BATCH_SIZE};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;

use super::Record;

/// Streams the records of one NDJSON file in fixed-size batches.
///
/// The file is opened anew for every pass, so one collection can be imported
/// more than once. Blank lines are skipped; any other line must hold a JSON
/// object.
#[derive(Debug, Clone)]
pub struct JsonLinesCollection {
    path: PathBuf,
    batch_size: usize,
}

impl JsonLinesCollection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size. A size of zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Collection<Record> for JsonLinesCollection {
    fn batches<'a>(
        &'a self,
        context: &'a Context,
    ) -> BoxStream<'a, Result<RecordBatch<Record>, PipelineError>> {
        let path = self.path.as_path();

        stream::once(File::open(self.path.clone()))
            .map_ok(|file| LinesStream::new(BufReader::new(file).lines()))
            .try_flatten()
            .enumerate()
            .filter_map(move |(position, line)| async move {
                match line {
                    Ok(line) if line.trim().is_empty() => None,
                    Ok(line) => Some(parse_record(path, position + 1, &line)),
                    Err(err) => Some(Err(PipelineError::collection(format!(
                        "{}: {}",
                        path.display(),
                        err
                    )))),
                }
            })
            .try_chunks(self.batch_size)
            .map(move |chunk| match chunk {
                Ok(records) => Ok(RecordBatch::new(records, context.clone())),
                Err(err) => Err(err.1),
            })
            .boxed()
    }
}

fn parse_record(path: &Path, line_number: usize, line: &str) -> Result<Record, PipelineError> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(PipelineError::collection(format!(
            "{}:{}: expected a JSON object",
            path.display(),
            line_number
        ))),
        Err(err) => Err(PipelineError::collection(format!(
            "{}:{}: {}",
            path.display(),
            line_number,
            err
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    async fn collect(
        collection: &JsonLinesCollection,
        context: &Context,
    ) -> Vec<Result<RecordBatch<Record>, PipelineError>> {
        collection.batches(context).collect().await
    }

    #[tokio::test]
    async fn test_batches_skip_blank_lines() {
        let file = write_lines(&[
            r#"{"id": 1, "name": "a"}"#,
            r#"{"id": 2, "name": "b"}"#,
            "",
            r#"{"id": 3, "name": "c"}"#,
            "   ",
            r#"{"id": 4, "name": "d"}"#,
            r#"{"id": 5, "name": "e"}"#,
        ]);
        let collection = JsonLinesCollection::new(file.path()).with_batch_size(2);
        let mut context = Context::new();
        context.insert("source".to_string(), json!("file"));

        let batches = collect(&collection, &context).await;

        let sizes: Vec<usize> = batches.iter().map(|b| b.as_ref().unwrap().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let first = batches[0].as_ref().unwrap();
        assert_eq!(first.records[1]["name"], json!("b"));
        assert_eq!(first.context, context);
        assert_eq!(batches[2].as_ref().unwrap().records[0]["id"], json!(5));
    }

    #[tokio::test]
    async fn test_collection_can_be_read_twice() {
        let file = write_lines(&[r#"{"id": 1}"#, r#"{"id": 2}"#]);
        let collection = JsonLinesCollection::new(file.path());
        let context = Context::new();

        assert_eq!(collect(&collection, &context).await.len(), 1);
        assert_eq!(collect(&collection, &context).await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_line_reports_position() {
        let file = write_lines(&[r#"{"id": 1}"#, "{not json", r#"{"id": 3}"#]);
        let collection = JsonLinesCollection::new(file.path());

        let batches = collect(&collection, &Context::new()).await;
        let err = batches
            .into_iter()
            .find_map(Result::err)
            .expect("malformed line should fail");

        assert!(matches!(err, PipelineError::Collection(_)));
        assert!(err.to_string().contains(":2:"));
    }

    #[tokio::test]
    async fn test_non_object_line_is_rejected() {
        let file = write_lines(&["[1, 2, 3]"]);
        let collection = JsonLinesCollection::new(file.path());

        let batches = collect(&collection, &Context::new()).await;

        assert_eq!(batches.len(), 1);
        let err = batches[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let collection = JsonLinesCollection::new("/nonexistent/records.ndjson");

        let batches = collect(&collection, &Context::new()).await;

        assert_eq!(batches.len(), 1);
        let err = batches[0].as_ref().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/records.ndjson"));
    }

    #[tokio::test]
    async fn test_empty_file_yields_nothing() {
        let file = write_lines(&[]);
        let collection = JsonLinesCollection::new(file.path());

        assert!(collect(&collection, &Context::new()).await.is_empty());
    }
}
