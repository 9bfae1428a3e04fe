//! Loader module for the synchronization pipeline.
//!
//! Turns collected bulk operations into physical requests against one index,
//! paced by a [`BulkThrottle`].

mod throttle;

pub use throttle::BulkThrottle;

use std::time::Duration;

use index_sync_repository::{
    BulkItem, BulkOperations, BulkRequest, BulkResponse, RequestParams, Transport, TransportError,
};
use index_sync_shared::{BulkRequestBuilder, BulkStats};
use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;

/// Aggregated outcome of one or more physical bulk requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkSummary {
    /// Operations sent, per action.
    pub stats: BulkStats,
    /// Number of physical requests.
    pub requests: usize,
    /// Whether any response reported item failures.
    pub errors: bool,
    /// The failed items, in response order.
    pub failed_items: Vec<BulkItem>,
}

impl BulkSummary {
    fn record(&mut self, stats: &BulkStats, response: BulkResponse) {
        self.stats.absorb(stats);
        self.requests += 1;
        self.errors |= response.errors;
        self.failed_items
            .extend(response.failed_items().cloned());
    }

    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: &BulkSummary) {
        self.stats.absorb(&other.stats);
        self.requests += other.requests;
        self.errors |= other.errors;
        self.failed_items.extend(other.failed_items.iter().cloned());
    }

    pub fn failure_count(&self) -> usize {
        self.failed_items.len()
    }
}

/// Sends bulk bodies for one target index.
///
/// The loader is responsible for:
/// - Refusing readonly clusters before any request
/// - Sizing bodies to the cluster's byte budget
/// - Dropping `_type` for engines without mapping types
/// - Pacing requests with the bulk wait interval
pub struct BulkLoader<'a> {
    transport: &'a Transport,
    index: String,
    params: RequestParams,
    max_body_bytes: usize,
    include_type: Option<bool>,
    throttle: BulkThrottle,
    summary: BulkSummary,
}

impl<'a> BulkLoader<'a> {
    /// Create a loader for `index`.
    ///
    /// Fails at once on a readonly cluster. No request is made until the
    /// first non-empty send.
    pub fn connect(
        transport: &'a Transport,
        index: impl Into<String>,
        wait_interval: Duration,
    ) -> Result<Self, PipelineError> {
        let cluster = transport.cluster();
        if cluster.readonly {
            warn!(cluster = %cluster.id, "Refusing bulk load on readonly cluster");
            return Err(TransportError::readonly(cluster.id.clone(), "bulk").into());
        }

        Ok(Self {
            transport,
            index: index.into(),
            params: RequestParams::default(),
            max_body_bytes: cluster.bulk_max_body_bytes,
            include_type: None,
            throttle: BulkThrottle::new(wait_interval),
            summary: BulkSummary::default(),
        })
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// An empty builder sized for this loader's cluster.
    pub fn builder(&self) -> BulkRequestBuilder {
        BulkRequestBuilder::new().max_body_bytes(self.max_body_bytes)
    }

    /// Whether bulk headers carry `_type`, from the cached engine info.
    async fn include_type(&mut self) -> Result<bool, PipelineError> {
        if let Some(include) = self.include_type {
            return Ok(include);
        }
        let include = self.transport.engine_info().await?.supports_mapping_types();
        self.include_type = Some(include);
        Ok(include)
    }

    /// Build and send every body collected in `builder`.
    ///
    /// Stops at the first transport error; requests already sent stay sent.
    #[instrument(skip(self, builder), fields(index = %self.index))]
    pub async fn send(&mut self, builder: BulkRequestBuilder) -> Result<BulkSummary, PipelineError> {
        if builder.stats().is_empty() {
            return Ok(BulkSummary::default());
        }
        let include_type = self.include_type().await?;
        let bodies = builder.include_type(include_type).build();
        let mut summary = BulkSummary::default();

        for body in &bodies {
            let wait = self.throttle.next_wait();
            let request = BulkRequest::new(&self.index, body, &self.params).with_wait_interval(wait);
            let response = self.transport.bulk(request).await?;
            summary.record(body.stats(), response);
        }

        if summary.errors {
            warn!(
                failed = summary.failure_count(),
                requests = summary.requests,
                "Bulk items failed"
            );
        } else {
            debug!(
                operations = summary.stats.total(),
                requests = summary.requests,
                "Bulk operations sent"
            );
        }

        self.summary.absorb(&summary);
        Ok(summary)
    }

    /// Everything sent through this loader so far.
    pub fn summary(&self) -> &BulkSummary {
        &self.summary
    }

    pub fn into_summary(self) -> BulkSummary {
        info!(
            index = %self.index,
            operations = self.summary.stats.total(),
            requests = self.summary.requests,
            "Bulk loading finished"
        );
        self.summary
    }
}
