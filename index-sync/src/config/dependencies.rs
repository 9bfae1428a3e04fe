//! Dependency initialization and wiring for the index synchronizer.

use std::sync::Arc;

use index_sync_repository::{
    ClusterRegistry, Instrumentation, OpenSearchEngine, SearchEngine, Transport,
};
use tracing::info;

use super::Settings;
use crate::telemetry;
use crate::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Registry holding the configured cluster.
    pub registry: Arc<ClusterRegistry>,
    /// Transport bound to the configured cluster.
    pub transport: Transport,
}

impl Dependencies {
    /// Connect to OpenSearch and verify the cluster is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the client cannot be built or the cluster is unhealthy
    pub async fn new(settings: &Settings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            cluster = %settings.cluster_id,
            index_prefix = ?settings.index_prefix,
            readonly = settings.readonly,
            "Initializing dependencies"
        );

        let engine = OpenSearchEngine::new(&settings.opensearch_url).map_err(|e| {
            IndexingError::config(format!("Failed to create OpenSearch client: {}", e))
        })?;
        let dependencies = Self::with_engine(settings, Arc::new(engine))?;

        let healthy = dependencies
            .transport
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;
        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        let engine_info = dependencies.transport.engine_info().await?;
        info!(
            distribution = %engine_info.distribution,
            version = %engine_info.version,
            "OpenSearch connection verified"
        );

        Ok(dependencies)
    }

    /// Wire the registry and transport around an existing engine.
    pub fn with_engine(
        settings: &Settings,
        engine: Arc<dyn SearchEngine>,
    ) -> Result<Self, IndexingError> {
        let instrumentation =
            Instrumentation::new().with_subscriber(Arc::new(telemetry::log_failed_event));
        let registry = Arc::new(ClusterRegistry::with_instrumentation(instrumentation));
        registry.register(settings.cluster(), engine);

        let transport = registry.transport(&settings.cluster_id).ok_or_else(|| {
            IndexingError::config(format!("Cluster '{}' is not registered", settings.cluster_id))
        })?;

        Ok(Self {
            registry,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_engine_registers_cluster() {
        let settings = Settings {
            index_prefix: Some("test".to_string()),
            readonly: true,
            ..Settings::default()
        };
        let engine = OpenSearchEngine::new(&settings.opensearch_url).unwrap();

        let dependencies = Dependencies::with_engine(&settings, Arc::new(engine)).unwrap();

        assert_eq!(dependencies.registry.ids(), vec![settings.cluster_id.clone()]);
        assert!(dependencies.transport.cluster().readonly);
        assert_eq!(
            dependencies.transport.cluster().index_name("users", None),
            "test_users"
        );
    }
}
