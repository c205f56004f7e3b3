//! Observability infrastructure for the listing browser
//!
//! Provides:
//! - Prometheus metrics (filter latency, loaded/visible listings, refresh failures)
//! - Structured logging of session events with tracing

use crate::filter::Dimension;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Encoder, Histogram,
    IntCounter, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for filter latency (in seconds)
const FILTER_LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScoutMetricsInner> = OnceLock::new();

struct ScoutMetricsInner {
    filter_latency_seconds: Histogram,
    listings_loaded: IntGauge,
    listings_visible: IntGauge,
    filter_runs: IntCounter,
    refresh_failures: IntCounter,
}

impl ScoutMetricsInner {
    fn new() -> Self {
        Self {
            filter_latency_seconds: register_histogram!(
                "scout_filter_latency_seconds",
                "Time spent applying filters to the loaded listing set",
                FILTER_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register filter_latency_seconds"),

            listings_loaded: register_int_gauge!(
                "scout_listings_loaded",
                "Number of listings in the current snapshot"
            )
            .expect("Failed to register listings_loaded"),

            listings_visible: register_int_gauge!(
                "scout_listings_visible",
                "Number of listings passing the current filter"
            )
            .expect("Failed to register listings_visible"),

            filter_runs: register_int_counter!(
                "scout_filter_runs_total",
                "Total number of filter recomputations"
            )
            .expect("Failed to register filter_runs"),

            refresh_failures: register_int_counter!(
                "scout_refresh_failures_total",
                "Total number of failed feed refreshes"
            )
            .expect("Failed to register refresh_failures"),
        }
    }
}

/// Handle to the process-wide metrics. Clones share the same metrics.
#[derive(Clone)]
pub struct ScoutMetrics {
    _private: (),
}

impl Default for ScoutMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoutMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScoutMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScoutMetricsInner {
        GLOBAL_METRICS.get_or_init(ScoutMetricsInner::new)
    }

    /// Record one filter pass and the size of its result
    pub fn observe_filter(&self, duration_secs: f64, visible: usize) {
        let inner = self.inner();
        inner.filter_latency_seconds.observe(duration_secs);
        inner.filter_runs.inc();
        inner.listings_visible.set(visible as i64);
    }

    pub fn set_listings_loaded(&self, count: usize) {
        self.inner().listings_loaded.set(count as i64);
    }

    pub fn inc_refresh_failures(&self) {
        self.inner().refresh_failures.inc();
    }

    pub fn filter_runs(&self) -> u64 {
        self.inner().filter_runs.get()
    }

    /// Render every registered metric in the text exposition format
    pub fn gather_text(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for session events
///
/// Every event carries an `event` field and the session label so log lines
/// from several sessions can be told apart.
#[derive(Clone)]
pub struct EventLogger {
    session: String,
}

impl EventLogger {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    pub fn log_session_started(&self, source: &str, debounce_ms: u128) {
        info!(
            event = "session_started",
            session = %self.session,
            source = %source,
            debounce_ms = debounce_ms as u64,
            "Listing session started"
        );
    }

    pub fn log_dataset_loaded(
        &self,
        source: &str,
        generation: u64,
        listings: usize,
        max_price: f64,
        max_ram: u32,
    ) {
        info!(
            event = "dataset_loaded",
            session = %self.session,
            source = %source,
            generation = generation,
            listings = listings,
            max_price = max_price,
            max_ram_gb = max_ram,
            "Loaded listing snapshot"
        );
    }

    pub fn log_refresh_failed(&self, source: &str, generation: u64, error: &str, kept: usize) {
        warn!(
            event = "refresh_failed",
            session = %self.session,
            source = %source,
            generation = generation,
            error = %error,
            kept_listings = kept,
            "Feed refresh failed, keeping previous snapshot"
        );
    }

    pub fn log_refresh_superseded(&self, generation: u64) {
        debug!(
            event = "refresh_superseded",
            session = %self.session,
            generation = generation,
            "Refresh aborted by a newer request"
        );
    }

    pub fn log_stale_view_dropped(&self, revision: u64, published: u64) {
        debug!(
            event = "stale_view_dropped",
            session = %self.session,
            revision = revision,
            published = published,
            "Filter pass finished after a newer edit was published"
        );
    }

    pub fn log_filters_applied(
        &self,
        active: &[Dimension],
        total: usize,
        visible: usize,
        elapsed_us: u128,
    ) {
        let active = active
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        debug!(
            event = "filters_applied",
            session = %self.session,
            active = %active,
            total = total,
            visible = visible,
            elapsed_us = elapsed_us as u64,
            "Applied filters"
        );
    }
}
