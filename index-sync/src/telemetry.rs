//! Log subscriber setup and the event logger attached to every transport.

use index_sync_repository::Event;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Surface failed transport operations at warn level.
pub fn log_failed_event(event: &Event) {
    if let Some(error) = &event.error {
        warn!(
            operation = %event.name,
            cluster = %event.cluster,
            index = ?event.index,
            duration_ms = event.duration.as_millis() as u64,
            error = %error,
            "Transport operation failed"
        );
    }
}
