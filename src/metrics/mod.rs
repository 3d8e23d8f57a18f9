//! Metrics module for Prometheus-based monitoring.
//!
//! Counts selections, collisions and kernel evaluations, and times each
//! selection.
//!
//! # Example
//!
//! ```ignore
//! use kernel_herding::metrics::{init_metrics, export_metrics, MetricsCollector};
//!
//! init_metrics().expect("Failed to initialize metrics");
//!
//! let collector = MetricsCollector::new();
//! collector.record_selection("rbf", &selection.stats, elapsed_secs);
//!
//! let metrics_text = export_metrics();
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use prometheus::{export_metrics, init_metrics};

pub use prometheus::{
    COLLISIONS_TOTAL, KERNEL_EVALUATIONS_TOTAL, REGISTRY, SELECTIONS_TOTAL, SELECTION_DURATION,
};
