//! Accuracy metrics for evaluating ensemble predictions.

use crate::error::{EnsembleError, Result};
use std::fmt;

/// Accuracy metrics for one prediction series.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error, as a fraction (None if zeros in actual)
    pub mape: Option<f64>,
    /// Mean Squared Percentage Error, as a fraction (None if zeros in actual)
    pub mspe: Option<f64>,
}

impl fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.5}"));
        write!(
            f,
            "mae={:.5} mse={:.5} rmse={:.5} mape={} mspe={}",
            self.mae,
            self.mse,
            self.rmse,
            pct(self.mape),
            pct(self.mspe)
        )
    }
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Arguments
/// * `actual` - Actual observed values
/// * `predicted` - Predicted values
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(EnsembleError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(EnsembleError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;
    let mae = mae(actual, predicted);
    let mse = mse(actual, predicted);

    // Percentage errors are undefined when any actual value is zero
    let (mape, mspe) = if actual.contains(&0.0) {
        (None, None)
    } else {
        let (abs_sum, sq_sum) = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| (p - a) / a)
            .fold((0.0, 0.0), |(abs, sq), r| (abs + r.abs(), sq + r * r));
        (Some(abs_sum / n), Some(sq_sum / n))
    };

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        mape,
        mspe,
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}
