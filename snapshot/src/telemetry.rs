// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const CATALOG_FAILURES: &str = "scheduler_catalog_failures_total";
const JOB_SNAPSHOTS: &str = "job_snapshots_total";

/// Initialize structured logging with JSON formatting
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(
        log_level = log_level,
        "Structured logging initialized with JSON formatting"
    );

    Ok(())
}

/// Register metric descriptions with whichever recorder the host installed.
///
/// `SnapshotService::from_settings` calls this; hosts that install a recorder
/// afterwards call it again themselves.
pub fn describe_metrics() {
    describe_counter!(
        CATALOG_FAILURES,
        "Job catalog queries that failed and were skipped"
    );
    describe_gauge!(JOB_SNAPSHOTS, "Job snapshots produced by the last poll");
}

/// Record a swallowed catalog query failure for `scheduler`
#[inline]
pub fn record_catalog_failure(scheduler: &str) {
    counter!(CATALOG_FAILURES, "scheduler" => scheduler.to_string()).increment(1);
}

/// Record the size of the last successful poll
#[inline]
pub fn record_snapshot_count(count: usize) {
    gauge!(JOB_SNAPSHOTS).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_rejects_malformed_level() {
        // RUST_LOG wins over the configured level when set
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(init_logging("not a level[").is_err());
    }

    #[test]
    fn test_metrics_recording() {
        // No recorder installed: must be a no-op
        describe_metrics();
        record_catalog_failure("main");
        record_snapshot_count(3);
    }
}
