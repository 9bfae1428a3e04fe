//! Process settings, read from flags or the environment.

use std::time::Duration;

use clap::{Args, ValueEnum};
use index_sync_repository::{Cluster, DEFAULT_BULK_MAX_BODY_BYTES, DEFAULT_CLUSTER_ID};

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Connection and cluster settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// OpenSearch server URL
    #[arg(long, env = "OPENSEARCH_URL", default_value = DEFAULT_OPENSEARCH_URL, global = true)]
    pub opensearch_url: String,

    /// Registry id of the cluster
    #[arg(long, env = "CLUSTER_ID", default_value = DEFAULT_CLUSTER_ID, global = true)]
    pub cluster_id: String,

    /// Prefix prepended to every index name
    #[arg(long, env = "INDEX_PREFIX", global = true)]
    pub index_prefix: Option<String>,

    /// Refuse every mutating request
    #[arg(long, env = "CLUSTER_READONLY", global = true)]
    pub readonly: bool,

    /// Pause between bulk requests, in milliseconds
    #[arg(long, env = "BULK_WAIT_INTERVAL_MS", default_value_t = 0, global = true)]
    pub bulk_wait_interval_ms: u64,

    /// Byte budget of one bulk request body
    #[arg(long, env = "BULK_MAX_BODY_BYTES", default_value_t = DEFAULT_BULK_MAX_BODY_BYTES, global = true)]
    pub bulk_max_body_bytes: usize,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            cluster_id: DEFAULT_CLUSTER_ID.to_string(),
            index_prefix: None,
            readonly: false,
            bulk_wait_interval_ms: 0,
            bulk_max_body_bytes: DEFAULT_BULK_MAX_BODY_BYTES,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    pub fn bulk_wait_interval(&self) -> Duration {
        Duration::from_millis(self.bulk_wait_interval_ms)
    }

    /// Cluster described by these settings.
    pub fn cluster(&self) -> Cluster {
        let mut cluster = Cluster::new(&self.cluster_id)
            .with_readonly(self.readonly)
            .with_bulk_wait_interval(self.bulk_wait_interval())
            .with_bulk_max_body_bytes(self.bulk_max_body_bytes);
        if let Some(prefix) = self.index_prefix.as_deref().filter(|p| !p.is_empty()) {
            cluster = cluster.with_index_prefix(prefix);
        }
        cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["index-sync"]);
        let cluster = cli.settings.cluster();

        assert_eq!(cli.settings.opensearch_url, DEFAULT_OPENSEARCH_URL);
        assert_eq!(cli.settings.log_format, LogFormat::Pretty);
        assert_eq!(cluster.id, DEFAULT_CLUSTER_ID);
        assert!(cluster.index_prefix.is_none());
        assert!(!cluster.readonly);
        assert_eq!(cluster.bulk_wait_interval, Duration::ZERO);
        assert_eq!(cluster.bulk_max_body_bytes, DEFAULT_BULK_MAX_BODY_BYTES);
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::parse_from([
            "index-sync",
            "--index-prefix",
            "staging",
            "--readonly",
            "--bulk-wait-interval-ms",
            "250",
            "--bulk-max-body-bytes",
            "1024",
            "--log-format",
            "json",
        ]);
        let cluster = cli.settings.cluster();

        assert_eq!(cluster.index_prefix.as_deref(), Some("staging"));
        assert!(cluster.readonly);
        assert_eq!(cluster.bulk_wait_interval, Duration::from_millis(250));
        assert_eq!(cluster.bulk_max_body_bytes, 1024);
        assert_eq!(cli.settings.log_format, LogFormat::Json);
        assert_eq!(cluster.index_name("users", None), "staging_users");
    }

    #[test]
    fn test_empty_prefix_is_ignored() {
        let settings = Settings {
            index_prefix: Some(String::new()),
            ..Settings::default()
        };
        assert!(settings.cluster().index_prefix.is_none());
    }
}
