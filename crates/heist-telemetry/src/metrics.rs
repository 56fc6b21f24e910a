//! Prometheus metrics for the vault heist coordinator.
//!
//! All metrics follow the naming convention: `heist_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., actions_applied_total)
//! - **Gauge**: Value that can go up or down (e.g., sessions_active)
//! - **Histogram**: Distribution of values (e.g., action_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SESSION METRICS
    // =========================================================================

    /// Sessions created
    pub static ref SESSIONS_CREATED: Counter = Counter::new(
        "heist_sessions_created_total",
        "Total number of sessions created"
    ).expect("metric creation failed");

    /// Sessions currently running
    pub static ref SESSIONS_ACTIVE: Gauge = Gauge::new(
        "heist_sessions_active",
        "Number of sessions not yet in a terminal state"
    ).expect("metric creation failed");

    /// Sessions reaching a terminal state
    pub static ref SESSIONS_TERMINATED: CounterVec = CounterVec::new(
        Opts::new("heist_sessions_terminated_total", "Sessions by terminal state"),
        &["state"]  // completed/failed/abandoned
    ).expect("metric creation failed");

    // =========================================================================
    // ACTION METRICS
    // =========================================================================

    /// Actions applied to session state
    pub static ref ACTIONS_APPLIED: CounterVec = CounterVec::new(
        Opts::new("heist_actions_applied_total", "Applied player actions"),
        &["kind", "outcome"]
    ).expect("metric creation failed");

    /// Actions rejected before touching state
    pub static ref ACTIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("heist_actions_rejected_total", "Rejected player actions"),
        &["kind"]
    ).expect("metric creation failed");

    /// Time spent applying one action inside the session task
    pub static ref ACTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "heist_action_duration_seconds",
            "Time spent validating and applying a player action"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("bucket layout"))
    ).expect("metric creation failed");

    /// Puzzles transitioned to solved
    pub static ref PUZZLES_SOLVED: CounterVec = CounterVec::new(
        Opts::new("heist_puzzles_solved_total", "Puzzles solved by kind"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // GUARD METRICS
    // =========================================================================

    /// Guard model updates applied
    pub static ref GUARD_UPDATES: Counter = Counter::new(
        "heist_guard_updates_total",
        "Guard learning rounds applied"
    ).expect("metric creation failed");

    /// Guard triggers skipped because an update was still running
    pub static ref GUARD_UPDATES_SKIPPED: Counter = Counter::new(
        "heist_guard_updates_skipped_total",
        "Guard learning triggers skipped while an update was in flight"
    ).expect("metric creation failed");

    /// Guard update duration on the blocking pool
    pub static ref GUARD_UPDATE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "heist_guard_update_duration_seconds",
            "Time spent training guard models"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("bucket layout"))
    ).expect("metric creation failed");

    // =========================================================================
    // INFRASTRUCTURE METRICS
    // =========================================================================

    /// Snapshots stored
    pub static ref SNAPSHOTS_PERSISTED: Counter = Counter::new(
        "heist_snapshots_persisted_total",
        "Snapshots written to the store"
    ).expect("metric creation failed");

    /// Snapshot writes that failed after all retries
    pub static ref PERSIST_FAILURES: Counter = Counter::new(
        "heist_snapshot_failures_total",
        "Snapshot writes that exhausted their retries"
    ).expect("metric creation failed");

    /// Reward settlements
    pub static ref SETTLEMENTS: CounterVec = CounterVec::new(
        Opts::new("heist_settlements_total", "Reward settlements by outcome"),
        &["outcome"]  // settled/retrying/failed
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Sessions
        Box::new(SESSIONS_CREATED.clone()),
        Box::new(SESSIONS_ACTIVE.clone()),
        Box::new(SESSIONS_TERMINATED.clone()),
        // Actions
        Box::new(ACTIONS_APPLIED.clone()),
        Box::new(ACTIONS_REJECTED.clone()),
        Box::new(ACTION_DURATION.clone()),
        Box::new(PUZZLES_SOLVED.clone()),
        // Guards
        Box::new(GUARD_UPDATES.clone()),
        Box::new(GUARD_UPDATES_SKIPPED.clone()),
        Box::new(GUARD_UPDATE_DURATION.clone()),
        // Infrastructure
        Box::new(SNAPSHOTS_PERSISTED.clone()),
        Box::new(PERSIST_FAILURES.clone()),
        Box::new(SETTLEMENTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_is_idempotent() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_counter_increment() {
        GUARD_UPDATES.inc();
        assert!(GUARD_UPDATES.get() >= 1.0);
    }

    #[test]
    fn test_labelled_counter() {
        ACTIONS_APPLIED.with_label_values(&["move", "success"]).inc();
        assert!(ACTIONS_APPLIED.with_label_values(&["move", "success"]).get() >= 1.0);
    }

    #[test]
    fn test_encode_after_register() {
        register_metrics().unwrap();
        SESSIONS_CREATED.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("heist_sessions_created_total"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = ACTION_DURATION.get_sample_count();
        {
            let _timer = HistogramTimer::new(&ACTION_DURATION);
        }
        assert!(ACTION_DURATION.get_sample_count() > before);
    }
}
