//! Instrumentation events emitted by the transport.
//!
//! Every transport operation produces exactly one [`Event`], whether it
//! succeeded or failed. Events are logged at debug level and handed to every
//! registered [`EventSubscriber`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use index_sync_shared::BulkStats;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Name of an instrumented operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    Bulk,
    CreateIndex,
    DeleteIndex,
    UpdateMapping,
    UpdateSettings,
    UpdateAliases,
    Open,
    Close,
    Refresh,
    Get,
    Exist,
    Count,
    Delete,
    Update,
    Index,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::CreateIndex => "create_index",
            Self::DeleteIndex => "delete_index",
            Self::UpdateMapping => "update_mapping",
            Self::UpdateSettings => "update_settings",
            Self::UpdateAliases => "update_aliases",
            Self::Open => "open",
            Self::Close => "close",
            Self::Refresh => "refresh",
            Self::Get => "get",
            Self::Exist => "exist",
            Self::Count => "count",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed transport operation.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub name: EventName,
    /// Cluster the operation ran against.
    pub cluster: String,
    pub index: Option<String>,
    /// Request parameters (and body, where small enough to be useful).
    pub request: Value,
    /// Raw response body on success.
    pub response: Option<Value>,
    /// Error message on failure.
    pub error: Option<String>,
    /// Per-action counts; bulk only.
    pub bulk_stats: Option<BulkStats>,
    /// Pause applied before the request; bulk only.
    pub wait_interval: Option<Duration>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl Event {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Receiver of instrumentation events.
pub trait EventSubscriber: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> EventSubscriber for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Fan-out hub for events.
#[derive(Clone, Default)]
pub struct Instrumentation {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl Instrumentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber.
    pub fn subscribe(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Builder-style variant of [`Instrumentation::subscribe`].
    pub fn with_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.subscribe(subscriber);
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Log the event and deliver it to every subscriber.
    pub fn emit(&self, event: &Event) {
        debug!(
            event = %event.name,
            cluster = %event.cluster,
            index = event.index.as_deref().unwrap_or(""),
            duration_ms = event.duration.as_millis() as u64,
            error = event.error.as_deref().unwrap_or(""),
            "Transport event"
        );

        for subscriber in &self.subscribers {
            subscriber.on_event(event);
        }
    }
}

impl fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumentation")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
