//! Cluster configuration and the named cluster registry.
//!
//! A [`Cluster`] is a plain value: it is configured through `with_*`
//! builders before being shared, and replaced wholesale when it has to
//! change. The [`ClusterRegistry`] is the only process-wide mutable state and
//! guards its map with a single mutex that is never held across an await.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::events::Instrumentation;
use crate::interfaces::SearchEngine;
use crate::transport::Transport;
use crate::types::EngineInfo;

/// Identifier of the cluster used when none is named.
pub const DEFAULT_CLUSTER_ID: &str = "default";

/// Default upper bound for one bulk request body (10 MiB).
pub const DEFAULT_BULK_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Settings of one search cluster.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Registry key.
    pub id: String,
    /// Prefix prepended to every index name (`prefix_name`).
    pub index_prefix: Option<String>,
    /// When set, every mutating operation is refused before any I/O.
    pub readonly: bool,
    /// Pause between successive bulk requests.
    pub bulk_wait_interval: Duration,
    /// Byte budget for a single bulk body.
    pub bulk_max_body_bytes: usize,
    engine_info: Arc<OnceCell<EngineInfo>>,
}

impl Default for Cluster {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_ID)
    }
}

impl Cluster {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index_prefix: None,
            readonly: false,
            bulk_wait_interval: Duration::ZERO,
            bulk_max_body_bytes: DEFAULT_BULK_MAX_BODY_BYTES,
            engine_info: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = Some(prefix.into());
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_bulk_wait_interval(mut self, interval: Duration) -> Self {
        self.bulk_wait_interval = interval;
        self
    }

    pub fn with_bulk_max_body_bytes(mut self, bytes: usize) -> Self {
        self.bulk_max_body_bytes = bytes;
        self
    }

    /// Full index name: `[prefix_]name[_suffix]`.
    ///
    /// The prefix is not repeated if `name` already carries it.
    pub fn index_name(&self, name: &str, suffix: Option<&str>) -> String {
        let mut full = match &self.index_prefix {
            Some(prefix) if !prefix.is_empty() && !name.starts_with(&format!("{}_", prefix)) => {
                format!("{}_{}", prefix, name)
            }
            _ => name.to_string(),
        };
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            full.push('_');
            full.push_str(suffix);
        }
        full
    }

    /// Engine info, if it has been fetched already.
    pub fn cached_engine_info(&self) -> Option<&EngineInfo> {
        self.engine_info.get()
    }

    pub(crate) fn engine_info_cell(&self) -> &OnceCell<EngineInfo> {
        &self.engine_info
    }
}

struct ClusterEntry {
    cluster: Arc<Cluster>,
    engine: Arc<dyn SearchEngine>,
}

/// Process-wide registry of named clusters and their engine handles.
#[derive(Default)]
pub struct ClusterRegistry {
    entries: Mutex<HashMap<String, ClusterEntry>>,
    instrumentation: Instrumentation,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose transports emit events to `instrumentation`.
    pub fn with_instrumentation(instrumentation: Instrumentation) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            instrumentation,
        }
    }

    /// Register (or replace) a cluster and its engine.
    pub fn register(&self, cluster: Cluster, engine: Arc<dyn SearchEngine>) {
        let id = cluster.id.clone();
        self.entries.lock().insert(
            id,
            ClusterEntry {
                cluster: Arc::new(cluster),
                engine,
            },
        );
    }

    /// Current settings of a cluster.
    pub fn cluster(&self, id: &str) -> Option<Arc<Cluster>> {
        self.entries.lock().get(id).map(|entry| entry.cluster.clone())
    }

    /// Replace the settings of a registered cluster.
    ///
    /// `change` receives a copy; in-flight transports keep the old value.
    pub fn update<F>(&self, id: &str, change: F) -> Option<Arc<Cluster>>
    where
        F: FnOnce(&mut Cluster),
    {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(id)?;
        let mut cluster = Cluster::clone(&entry.cluster);
        change(&mut cluster);
        entry.cluster = Arc::new(cluster);
        Some(entry.cluster.clone())
    }

    /// Build a transport for the named cluster.
    pub fn transport(&self, id: &str) -> Option<Transport> {
        let entries = self.entries.lock();
        let entry = entries.get(id)?;
        Some(Transport::new(
            entry.engine.clone(),
            entry.cluster.clone(),
            self.instrumentation.clone(),
        ))
    }

    /// Registered cluster ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for ClusterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterRegistry")
            .field("clusters", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name() {
        let plain = Cluster::default();
        assert_eq!(plain.index_name("users", None), "users");
        assert_eq!(plain.index_name("users", Some("2024")), "users_2024");

        let prefixed = Cluster::default().with_index_prefix("app");
        assert_eq!(prefixed.index_name("users", None), "app_users");
        assert_eq!(prefixed.index_name("app_users", Some("v2")), "app_users_v2");
        assert_eq!(prefixed.index_name("users", Some("")), "app_users");
    }

    #[test]
    fn test_defaults() {
        let cluster = Cluster::default();
        assert_eq!(cluster.id, DEFAULT_CLUSTER_ID);
        assert!(!cluster.readonly);
        assert_eq!(cluster.bulk_wait_interval, Duration::ZERO);
        assert!(cluster.cached_engine_info().is_none());
    }
}
