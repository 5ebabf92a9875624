//! Weighted combination of base-model predictions.
//!
//! Combines several base models into a single one-step prediction. With
//! inverse-MSE weighting the weights follow each model's recent accuracy and
//! are refreshed online, after every prediction, while training.

use crate::core::Batch;
use crate::data::DataLoader;
use crate::error::{EnsembleError, Result};
use crate::models::{BaseModel, BoxedBaseModel, Combiner, CombinerOutput};
use tracing::{debug, info};

/// Method for combining predictions from multiple models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombinationMethod {
    /// Simple average of all predictions.
    Mean,
    /// Median of all predictions.
    Median,
    /// Weighted by inverse exponentially-discounted squared error.
    ///
    /// `discount` in `(0, 1]` scales the accumulated error before each new
    /// squared error is added; 1.0 weighs the whole history equally.
    InverseMse { discount: f64 },
    /// Custom weights provided by user.
    Custom,
}

/// Combiner over a fixed set of base models.
pub struct WeightedCombiner {
    models: Vec<BoxedBaseModel>,
    method: CombinationMethod,
    custom_weights: Option<Vec<f64>>,
    /// Current normalized weights.
    weights: Vec<f64>,
    /// Discounted squared error per model.
    errors: Vec<f64>,
    /// Truths observed so far.
    observed: usize,
    is_trained: bool,
}

impl WeightedCombiner {
    /// Create a combiner averaging the given models.
    pub fn new(models: Vec<BoxedBaseModel>) -> Self {
        let n = models.len();
        Self {
            models,
            method: CombinationMethod::Mean,
            custom_weights: None,
            weights: uniform(n),
            errors: vec![0.0; n],
            observed: 0,
            is_trained: false,
        }
    }

    /// Set the combination method.
    pub fn with_method(mut self, method: CombinationMethod) -> Self {
        self.method = method;
        self
    }

    /// Set custom weights (must match number of models).
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.custom_weights = Some(weights);
        self.method = CombinationMethod::Custom;
        self
    }

    /// Get the current weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn method(&self) -> CombinationMethod {
        self.method
    }

    /// Number of truths the combiner has been updated with.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Forget all learned state.
    pub fn reset(&mut self) {
        let n = self.models.len();
        self.errors = vec![0.0; n];
        self.weights = uniform(n);
        self.observed = 0;
        self.is_trained = false;
    }

    fn validate(&mut self) -> Result<()> {
        if self.models.is_empty() {
            return Err(EnsembleError::ComputationError(
                "combiner has no base models".to_string(),
            ));
        }
        match self.method {
            CombinationMethod::InverseMse { discount } => {
                if !(discount > 0.0 && discount <= 1.0) {
                    return Err(EnsembleError::InvalidParameter(format!(
                        "discount must lie in (0, 1], got {discount}"
                    )));
                }
            }
            CombinationMethod::Custom => {
                let custom = self.custom_weights.as_ref().ok_or_else(|| {
                    EnsembleError::InvalidParameter("custom weights not set".to_string())
                })?;
                if custom.len() != self.models.len() {
                    return Err(EnsembleError::DimensionMismatch {
                        expected: self.models.len(),
                        got: custom.len(),
                    });
                }
                let sum: f64 = custom.iter().sum();
                if sum <= 0.0 || custom.iter().any(|w| *w < 0.0) {
                    return Err(EnsembleError::InvalidParameter(
                        "custom weights must be non-negative with a positive sum".to_string(),
                    ));
                }
                self.weights = custom.iter().map(|w| w / sum).collect();
            }
            CombinationMethod::Mean | CombinationMethod::Median => {}
        }
        Ok(())
    }

    fn combine(&self, predictions: &[f64]) -> f64 {
        match self.method {
            CombinationMethod::Mean => predictions.iter().sum::<f64>() / predictions.len() as f64,
            CombinationMethod::Median => {
                let mut vals = predictions.to_vec();
                vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let n = vals.len();
                if n % 2 == 0 {
                    (vals[n / 2 - 1] + vals[n / 2]) / 2.0
                } else {
                    vals[n / 2]
                }
            }
            CombinationMethod::InverseMse { .. } | CombinationMethod::Custom => predictions
                .iter()
                .zip(self.weights.iter())
                .map(|(p, w)| p * w)
                .sum(),
        }
    }

    /// Fold one revealed truth into the error statistics.
    fn update(&mut self, predictions: &[f64], truth: f64) {
        self.observed += 1;
        if let CombinationMethod::InverseMse { discount } = self.method {
            for (e, p) in self.errors.iter_mut().zip(predictions) {
                *e = discount * *e + (truth - p).powi(2);
            }
            self.weights = inverse_error_weights(&self.errors);
        }
        for model in &mut self.models {
            model.observe(truth);
        }
    }
}

impl std::fmt::Debug for WeightedCombiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedCombiner")
            .field("models", &self.base_model_names())
            .field("method", &self.method)
            .field("weights", &self.weights)
            .field("observed", &self.observed)
            .finish()
    }
}

fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        Vec::new()
    } else {
        vec![1.0 / n as f64; n]
    }
}

/// Normalized inverse of the accumulated errors.
fn inverse_error_weights(errors: &[f64]) -> Vec<f64> {
    let inv: Vec<f64> = errors.iter().map(|e| 1.0 / e.max(1e-10)).collect();
    let sum: f64 = inv.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        inv.iter().map(|w| w / sum).collect()
    } else {
        uniform(errors.len())
    }
}

impl Combiner for WeightedCombiner {
    fn name(&self) -> &str {
        match self.method {
            CombinationMethod::Mean => "Combiner (Mean)",
            CombinationMethod::Median => "Combiner (Median)",
            CombinationMethod::InverseMse { .. } => "Combiner (Inverse MSE)",
            CombinationMethod::Custom => "Combiner (Custom)",
        }
    }

    fn base_model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name().to_string()).collect()
    }

    fn base_model_count(&self) -> usize {
        self.models.len()
    }

    fn proceed_onestep(&mut self, batch: &Batch, training: bool) -> Result<CombinerOutput> {
        let b = batch.batch_size();
        if b != 1 {
            return Err(EnsembleError::StepBatchSize { got: b });
        }
        if self.observed == 0 {
            self.validate()?;
        }

        let base_predictions = self
            .models
            .iter()
            .map(|m| m.predict(batch))
            .collect::<Result<Vec<f64>>>()?;
        let prediction = self.combine(&base_predictions);

        if training {
            let truth = batch.truth()?;
            self.update(&base_predictions, truth);
        }

        Ok(CombinerOutput {
            prediction,
            base_predictions,
        })
    }

    /// Warm the error statistics with one chronological pass.
    fn train(&mut self, loader: &DataLoader) -> Result<()> {
        self.reset();
        self.validate()?;
        for batch in loader {
            self.proceed_onestep(&batch?, true)?;
        }
        self.is_trained = true;
        info!(
            combiner = self.name(),
            steps = self.observed,
            "combiner trained"
        );
        debug!(weights = ?self.weights, "combiner weights");
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.is_trained
    }
}
