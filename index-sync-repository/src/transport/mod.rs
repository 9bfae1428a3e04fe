//! Guarded, instrumented access to a search engine.
//!
//! The transport wraps a raw [`SearchEngine`] for one [`Cluster`]. It
//! refuses mutating calls on readonly clusters before any I/O, coerces raw
//! engine errors into [`TransportError`], and emits one event per call.
//! Operation groups are implemented in the submodules.

mod aliases;
mod bulk;
mod documents;
mod indices;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::config::Cluster;
use crate::errors::{EngineError, TransportError};
use crate::events::{Event, EventName, Instrumentation};
use crate::interfaces::SearchEngine;
use crate::types::EngineInfo;

/// Transport bound to a single cluster.
#[derive(Clone)]
pub struct Transport {
    engine: Arc<dyn SearchEngine>,
    cluster: Arc<Cluster>,
    instrumentation: Instrumentation,
}

/// Context recorded on the event for one call.
struct Call<'a> {
    name: EventName,
    index: Option<&'a str>,
    request: Value,
}

impl<'a> Call<'a> {
    fn new(name: EventName, index: Option<&'a str>, request: Value) -> Self {
        Self {
            name,
            index,
            request,
        }
    }
}

impl Transport {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        cluster: Arc<Cluster>,
        instrumentation: Instrumentation,
    ) -> Self {
        Self {
            engine,
            cluster,
            instrumentation,
        }
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }

    /// Distribution and version of the engine, fetched once per cluster.
    pub async fn engine_info(&self) -> Result<EngineInfo, TransportError> {
        let info = self
            .cluster
            .engine_info_cell()
            .get_or_try_init(|| async {
                let raw = self.engine.info().await?;
                EngineInfo::from_value(&raw)
            })
            .await?;
        Ok(info.clone())
    }

    /// Whether the engine responds and reports a non-red status.
    pub async fn health_check(&self) -> Result<bool, TransportError> {
        let health = self.engine.health().await?;
        Ok(health
            .get("status")
            .and_then(Value::as_str)
            .map(|status| status != "red")
            .unwrap_or(false))
    }

    /// Refuse mutating operations on readonly clusters.
    fn guard(&self, operation: &'static str) -> Result<(), TransportError> {
        if self.cluster.readonly {
            warn!(
                cluster = %self.cluster.id,
                operation = operation,
                "Refusing mutating operation on readonly cluster"
            );
            return Err(TransportError::readonly(self.cluster.id.clone(), operation));
        }
        Ok(())
    }

    /// Run an engine call and emit its event.
    async fn observe<T, F>(&self, call: Call<'_>, fut: F) -> Result<T, EngineError>
    where
        T: Into<Value> + Clone,
        F: Future<Output = Result<T, EngineError>> + Send,
    {
        self.observe_with(call, fut, |event| event).await
    }

    /// Like [`Transport::observe`], with a hook to enrich the event.
    async fn observe_with<T, F, E>(
        &self,
        call: Call<'_>,
        fut: F,
        enrich: E,
    ) -> Result<T, EngineError>
    where
        T: Into<Value> + Clone,
        F: Future<Output = Result<T, EngineError>> + Send,
        E: FnOnce(Event) -> Event,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let result = fut.await;

        let (response, error) = match &result {
            Ok(value) => (Some(value.clone().into()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        let event = enrich(Event {
            name: call.name,
            cluster: self.cluster.id.clone(),
            index: call.index.map(str::to_string),
            request: call.request,
            response,
            error,
            bulk_stats: None,
            wait_interval: None,
            started_at,
            duration: start.elapsed(),
        });
        self.instrumentation.emit(&event);

        result
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("cluster", &self.cluster.id)
            .field("readonly", &self.cluster.readonly)
            .finish()
    }
}

/// `acknowledged` flag of an index/alias management response.
fn acknowledged(response: &Value) -> bool {
    response
        .get("acknowledged")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
