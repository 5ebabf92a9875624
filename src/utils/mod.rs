//! Utility functions for evaluating predictions.

pub mod metrics;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use stats::quantile_normal;
