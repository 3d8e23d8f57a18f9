//! Prometheus metrics registration and export.
//!
//! This module defines the Prometheus metrics recorded by kernel-herding
//! and provides functions for initializing, registering, and exporting them.

use prometheus::{Counter, CounterVec, Encoder, Histogram, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all kernel-herding metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Completed selections, labeled by kernel kind.
pub static SELECTIONS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Collisions, labeled by how they were resolved (trail or random).
pub static COLLISIONS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Kernel evaluations performed across all selections.
pub static KERNEL_EVALUATIONS_TOTAL: OnceLock<Counter> = OnceLock::new();

/// Wall-clock duration of a selection in seconds.
pub static SELECTION_DURATION: OnceLock<Histogram> = OnceLock::new();

/// Initialize all metrics and register them with the registry.
///
/// Safe to call more than once; later calls leave the first registry in
/// place.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric creation or registration fails.
///
/// # Example
///
/// ```ignore
/// use kernel_herding::metrics::init_metrics;
///
/// init_metrics().expect("Failed to initialize metrics");
/// ```
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let selections_total = CounterVec::new(
        Opts::new(
            "kernel_herding_selections_total",
            "Total number of completed herding selections",
        ),
        &["kernel"],
    )?;

    let collisions_total = CounterVec::new(
        Opts::new(
            "kernel_herding_collisions_total",
            "Total number of collisions with already selected items",
        ),
        &["resolution"],
    )?;

    let kernel_evaluations_total = Counter::new(
        "kernel_herding_kernel_evaluations_total",
        "Total number of kernel evaluations",
    )?;

    let selection_duration = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "kernel_herding_selection_duration_seconds",
            "Herding selection duration in seconds",
        )
        .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0]),
    )?;

    registry.register(Box::new(selections_total.clone()))?;
    registry.register(Box::new(collisions_total.clone()))?;
    registry.register(Box::new(kernel_evaluations_total.clone()))?;
    registry.register(Box::new(selection_duration.clone()))?;

    // If any of these fail, metrics were already initialized
    let _ = REGISTRY.set(registry);
    let _ = SELECTIONS_TOTAL.set(selections_total);
    let _ = COLLISIONS_TOTAL.set(collisions_total);
    let _ = KERNEL_EVALUATIONS_TOTAL.set(kernel_evaluations_total);
    let _ = SELECTION_DURATION.set(selection_duration);

    tracing::debug!("Prometheus metrics initialized");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns an explanatory comment line if the registry has not been
/// initialized or encoding fails.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}
