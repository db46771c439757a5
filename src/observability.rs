//! Logging setup for the binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! caller's choice. Logs go to stderr so stdout stays free for reports.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable multi-line events.
    #[default]
    Pretty,
    /// Single-line events.
    Compact,
}

/// Install the global subscriber. Later calls are no-ops.
///
/// Filtering follows `RUST_LOG`, defaulting to `default_level`.
pub fn init_logging(format: LogFormat, default_level: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let registry = tracing_subscriber::registry().with(env_filter);

        // A subscriber installed elsewhere (a test harness) wins.
        let _ = match format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init(),
        };
    });
}

/// Span covering one crawl run.
#[must_use]
pub fn crawl_span(bucket: &str, prefix: &str) -> Span {
    tracing::info_span!("crawl", bucket = bucket, prefix = prefix)
}
