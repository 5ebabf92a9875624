//! Statistical utility functions.

use crate::error::{EnsembleError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile of the standard normal distribution.
///
/// # Example
/// ```
/// use tabe_ensemble::utils::quantile_normal;
///
/// // 95% two-sided level -> z ≈ 1.96
/// let z = quantile_normal(0.975).unwrap();
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn quantile_normal(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(EnsembleError::InvalidParameter(format!(
            "probability must lie in (0, 1), got {p}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| EnsembleError::ComputationError(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the standard deviation of a slice (population, n denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}
