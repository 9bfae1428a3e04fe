//! Bulk operations.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{Call, Transport};
use crate::errors::TransportError;
use crate::events::EventName;
use crate::interfaces::{BulkOperations, BulkRequest};
use crate::types::BulkResponse;

#[async_trait]
impl BulkOperations for Transport {
    #[instrument(
        skip(self, request),
        fields(index = %request.index, operations = request.body.len())
    )]
    async fn bulk(&self, request: BulkRequest<'_>) -> Result<BulkResponse, TransportError> {
        self.guard("bulk")?;

        if !request.wait_interval.is_zero() {
            debug!(
                wait_ms = request.wait_interval.as_millis() as u64,
                "Waiting before bulk request"
            );
            tokio::time::sleep(request.wait_interval).await;
        }

        let stats = request.body.stats().clone();
        let wait_interval = request.wait_interval;
        let call = Call::new(
            EventName::Bulk,
            Some(request.index),
            json!({
                "params": request.params.to_value(),
                "operations": request.body.len(),
                "bytes": request.body.byte_size(),
            }),
        );

        let raw = self
            .observe_with(
                call,
                self.engine
                    .bulk(request.index, request.body, request.params),
                |mut event| {
                    event.bulk_stats = Some(stats);
                    event.wait_interval = Some(wait_interval);
                    event
                },
            )
            .await?;

        let response = BulkResponse::from_value(raw)?;
        if response.errors {
            warn!(
                index = %request.index,
                failed = response.failure_count(),
                total = response.items.len(),
                "Bulk request completed with item failures"
            );
        } else {
            debug!(index = %request.index, took = response.took, "Bulk request completed");
        }

        Ok(response)
    }
}
