//! High-level recording of herding metrics.
//!
//! `MetricsCollector` wraps the raw Prometheus metrics so callers record a
//! finished selection in one call. Every method is a no-op until
//! `init_metrics()` has run.

use super::prometheus::{
    COLLISIONS_TOTAL, KERNEL_EVALUATIONS_TOTAL, SELECTIONS_TOTAL, SELECTION_DURATION,
};
use crate::herding::SelectionStats;

/// Metrics collector for kernel herding runs.
///
/// # Example
///
/// ```ignore
/// use kernel_herding::metrics::{init_metrics, MetricsCollector};
///
/// init_metrics().expect("Failed to init metrics");
/// let collector = MetricsCollector::new();
/// collector.record_selection("rbf", &selection.stats, 0.42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record a completed selection.
    ///
    /// # Arguments
    ///
    /// * `kernel` - Kernel kind label (e.g., "rbf", "poly")
    /// * `stats` - Counters of the finished run
    /// * `duration_secs` - Wall-clock duration of the selection
    pub fn record_selection(&self, kernel: &str, stats: &SelectionStats, duration_secs: f64) {
        if let Some(selections) = SELECTIONS_TOTAL.get() {
            selections.with_label_values(&[kernel]).inc();
        }

        if let Some(collisions) = COLLISIONS_TOTAL.get() {
            collisions
                .with_label_values(&["trail"])
                .inc_by(stats.trail_resolutions as f64);
            collisions
                .with_label_values(&["random"])
                .inc_by(stats.random_fallbacks as f64);
        }

        if let Some(evaluations) = KERNEL_EVALUATIONS_TOTAL.get() {
            evaluations.inc_by(stats.kernel_evaluations as f64);
        }

        if let Some(duration) = SELECTION_DURATION.get() {
            duration.observe(duration_secs);
        }

        tracing::trace!(
            kernel = kernel,
            selected = stats.target_size,
            collisions = stats.collisions,
            duration_secs = duration_secs,
            "Recorded selection metric"
        );
    }
}
