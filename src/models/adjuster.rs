//! Residual-bias adjuster.
//!
//! Tracks an exponentially weighted mean of the combiner's past residuals
//! and adds it to each new combiner prediction.

use crate::error::{EnsembleError, Result};
use crate::models::Adjuster;
use ndarray::{Array1, ArrayView1};
use tracing::debug;

/// Corrects systematic combiner bias.
#[derive(Debug, Clone)]
pub struct ResidualAdjuster {
    alpha: f64,
    bias: f64,
    steps: usize,
}

impl ResidualAdjuster {
    /// Create an adjuster with smoothing factor `alpha` in `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(EnsembleError::InvalidParameter(format!(
                "alpha must lie in (0, 1], got {alpha}"
            )));
        }
        Ok(Self {
            alpha,
            bias: 0.0,
            steps: 0,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Current bias estimate.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn reset(&mut self) {
        self.bias = 0.0;
        self.steps = 0;
    }
}

impl Default for ResidualAdjuster {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            bias: 0.0,
            steps: 0,
        }
    }
}

impl Adjuster for ResidualAdjuster {
    fn name(&self) -> &str {
        "ResidualAdjuster"
    }

    /// Replay the series from a fresh state, one step at a time.
    fn train(
        &mut self,
        truths: ArrayView1<'_, f64>,
        combiner_predictions: ArrayView1<'_, f64>,
    ) -> Result<Array1<f64>> {
        if truths.len() != combiner_predictions.len() {
            return Err(EnsembleError::LengthMismatch {
                predictions: combiner_predictions.len(),
                truths: truths.len(),
            });
        }
        self.reset();
        let mut adjusted = Array1::zeros(truths.len());
        for (t, (&truth, &cbm)) in truths.iter().zip(combiner_predictions.iter()).enumerate() {
            adjusted[t] = self.proceed_onestep(truth, cbm, true)?;
        }
        debug!(steps = self.steps, bias = self.bias, "adjuster trained");
        Ok(adjusted)
    }

    fn proceed_onestep(&mut self, truth: f64, combiner_prediction: f64, training: bool) -> Result<f64> {
        let corrected = combiner_prediction + self.bias;
        if training {
            let residual = truth - combiner_prediction;
            self.bias = if self.steps == 0 {
                residual
            } else {
                self.alpha * residual + (1.0 - self.alpha) * self.bias
            };
            self.steps += 1;
        }
        Ok(corrected)
    }
}
