//! Prometheus metrics for catalog ingestion.
//!
//! This module provides metrics for:
//! - Seeding (rows written and rows rejected, per source)
//! - Fetching (transfers by result, duration, bytes)
//! - Sync runs (per-source outcome)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Registry holding every metric below.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

// =============================================================================
// Seeding
// =============================================================================

/// Rows written to the store, by source and action.
pub static ROWS_INGESTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nps_rows_ingested_total", "Catalog rows written to the store"),
        &["source_type", "action"], // action: "inserted", "updated"
    )
    .unwrap()
});

/// Rows rejected, by source and error kind.
pub static ROWS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nps_rows_failed_total", "Catalog rows that could not be ingested"),
        &["source_type", "kind"], // kind: "missing_field", "invalid_enum", ..., "store"
    )
    .unwrap()
});

// =============================================================================
// Fetching
// =============================================================================

/// Fetches total by result.
pub static FETCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nps_fetches_total", "Total catalog fetches"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Fetch duration in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("nps_fetch_duration_seconds", "Duration of catalog fetches")
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

/// Bytes written to cache files.
pub static BYTES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("nps_fetched_bytes_total", "Total bytes fetched from sources").unwrap()
});

// =============================================================================
// Sync
// =============================================================================

/// Sources processed by outcome.
pub static SOURCES_SYNCED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("nps_sources_synced_total", "Sources processed by sync runs"),
        &["outcome"], // "ingested", "fetch_failed", "ingest_failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ROWS_INGESTED.clone()),
        Box::new(ROWS_FAILED.clone()),
        Box::new(FETCHES_TOTAL.clone()),
        Box::new(FETCH_DURATION.clone()),
        Box::new(BYTES_FETCHED.clone()),
        Box::new(SOURCES_SYNCED.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_touched_metrics() {
        ROWS_INGESTED
            .with_label_values(&["METRICS_TEST", "inserted"])
            .inc();
        FETCHES_TOTAL.with_label_values(&["success"]).inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("nps_rows_ingested_total"));
        assert!(text.contains(r#"source_type="METRICS_TEST""#));
        assert!(text.contains("nps_fetches_total"));
    }

    #[test]
    fn test_registry_gathers_every_metric() {
        for outcome in ["ingested", "fetch_failed", "ingest_failed"] {
            SOURCES_SYNCED.with_label_values(&[outcome]).inc_by(0);
        }
        ROWS_FAILED
            .with_label_values(&["METRICS_TEST", "invalid_number"])
            .inc_by(0);
        FETCH_DURATION.with_label_values(&["success"]).observe(0.0);
        BYTES_FETCHED.inc_by(0);

        let families = REGISTRY.gather();
        let names = families.iter().map(|f| f.get_name()).collect::<Vec<_>>();
        for name in [
            "nps_rows_ingested_total",
            "nps_rows_failed_total",
            "nps_fetches_total",
            "nps_fetch_duration_seconds",
            "nps_fetched_bytes_total",
            "nps_sources_synced_total",
        ] {
            assert!(names.contains(&name), "{name} not registered");
        }

        let text = encode_metrics().unwrap();
        assert!(text.contains(r#"outcome="ingest_failed""#));
    }
}
