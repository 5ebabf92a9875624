//! Test-pass results and their evaluation.

use crate::error::{EnsembleError, Result};
use crate::utils::{calculate_metrics, quantile_normal, stats::std_dev, AccuracyMetrics};
use ndarray::{Array1, Array2};
use std::fmt;

/// Aligned series produced by one test pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub truths: Array1<f64>,
    /// Final output (equal to `adjusted`).
    pub ensemble: Array1<f64>,
    pub adjusted: Array1<f64>,
    pub combiner: Array1<f64>,
    /// Base-model predictions, shape `(n_base, n_steps)`.
    pub base: Array2<f64>,
    pub base_names: Vec<String>,
    /// Whether the series were mapped back to original units.
    pub inverted: bool,
}

impl TestOutcome {
    /// Number of test steps.
    pub fn len(&self) -> usize {
        self.truths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truths.is_empty()
    }

    /// Accuracy of the ensemble, the combiner and every base model.
    pub fn report(&self) -> Result<EnsembleReport> {
        let truths = self.truths.to_vec();
        let base = self
            .base
            .rows()
            .into_iter()
            .zip(&self.base_names)
            .map(|(row, name)| Ok((name.clone(), calculate_metrics(&truths, &row.to_vec())?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(EnsembleReport {
            ensemble: calculate_metrics(&truths, &self.ensemble.to_vec())?,
            combiner: calculate_metrics(&truths, &self.combiner.to_vec())?,
            base,
        })
    }

    /// Standard deviation of the ensemble residuals `truth - ensemble`.
    pub fn residual_std(&self) -> Result<f64> {
        if self.is_empty() {
            return Err(EnsembleError::EmptyData);
        }
        let residuals = (&self.truths - &self.ensemble).to_vec();
        Ok(std_dev(&residuals))
    }

    /// Symmetric band `ensemble ∓ z(q)·σ`, returned as `(lower, upper)`.
    pub fn quantile_band(&self, q: f64) -> Result<(Array1<f64>, Array1<f64>)> {
        let half_width = quantile_normal(q)? * self.residual_std()?;
        Ok((
            self.ensemble.mapv(|y| y - half_width),
            self.ensemble.mapv(|y| y + half_width),
        ))
    }

    /// Level below which the next value falls with probability `1 - p`.
    pub fn buy_threshold(&self, p: f64) -> Result<Array1<f64>> {
        let offset = quantile_normal(p)? * self.residual_std()?;
        Ok(self.ensemble.mapv(|y| y - offset))
    }
}

/// Accuracy of each stage of the ensemble on the test split.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleReport {
    pub ensemble: AccuracyMetrics,
    pub combiner: AccuracyMetrics,
    /// Per base model, in combiner order.
    pub base: Vec<(String, AccuracyMetrics)>,
}

impl fmt::Display for EnsembleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {}", "ensemble", self.ensemble)?;
        write!(f, "{:<24} {}", "combiner", self.combiner)?;
        for (name, metrics) in &self.base {
            write!(f, "\n{name:<24} {metrics}")?;
        }
        Ok(())
    }
}
