//! Collaborator traits the ensemble engine is written against.
//!
//! The engine never looks inside a combiner or adjuster. All three traits are
//! object-safe and are used as `Box<dyn _>`.

use crate::core::Batch;
use crate::data::DataLoader;
use crate::error::Result;
use ndarray::{Array1, ArrayView1};

/// A single forecasting model evaluated one window at a time.
pub trait BaseModel: Send {
    /// Get the model name.
    fn name(&self) -> &str;

    /// Predict the next value of the target from the input window of a
    /// single-window batch.
    fn predict(&self, batch: &Batch) -> Result<f64>;

    /// Reveal the truth for the step just predicted.
    fn observe(&mut self, truth: f64) {
        let _ = truth;
    }
}

/// Type alias for boxed base models.
pub type BoxedBaseModel = Box<dyn BaseModel>;

/// What a combiner produces for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinerOutput {
    /// Combined prediction.
    pub prediction: f64,
    /// One prediction per base model, in registration order.
    pub base_predictions: Vec<f64>,
}

/// First stage: combines base-model predictions into one.
pub trait Combiner: Send {
    fn name(&self) -> &str;

    /// Names of the underlying base models, in output order.
    fn base_model_names(&self) -> Vec<String>;

    fn base_model_count(&self) -> usize {
        self.base_model_names().len()
    }

    /// Predict the step held by `batch`.
    ///
    /// The prediction must be formed before anything derived from the batch's
    /// truth touches the combiner's state. With `training` set the combiner
    /// may update itself with that truth afterwards.
    fn proceed_onestep(&mut self, batch: &Batch, training: bool) -> Result<CombinerOutput>;

    /// Fit on a loader over the training split.
    fn train(&mut self, loader: &DataLoader) -> Result<()> {
        let _ = loader;
        Ok(())
    }

    /// Whether [`Combiner::train`] has run (or is not needed).
    fn is_trained(&self) -> bool {
        true
    }
}

/// Second stage: sequential correction of the combiner's output.
pub trait Adjuster: Send {
    fn name(&self) -> &str;

    /// Fit over a whole aligned series and return the corrected series.
    fn train(
        &mut self,
        truths: ArrayView1<'_, f64>,
        combiner_predictions: ArrayView1<'_, f64>,
    ) -> Result<Array1<f64>>;

    /// Correct one combiner prediction; `truth` is only used for the update
    /// that follows when `training` is set.
    fn proceed_onestep(&mut self, truth: f64, combiner_prediction: f64, training: bool)
        -> Result<f64>;
}
