//! Online ensemble orchestration.
//!
//! Drives a combiner and an optional adjuster over time-ordered, one-window
//! batches. Every prediction is produced before the truth of its step is
//! used for any update, and every step is recorded in the history.

use crate::config::RunConfig;
use crate::core::Batch;
use crate::data::{Dataset, DatasetProvider, Split, SplitDataset};
use crate::ensemble::history::{PredictionHistory, StepRecord};
use crate::ensemble::inverse::{invert_target_rows, invert_target_series};
use crate::ensemble::report::TestOutcome;
use crate::error::{EnsembleError, Result};
use crate::models::{Adjuster, Combiner, CombinerOutput};
use ndarray::{Array1, Array2};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Lifecycle of an [`OnlineEnsemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Untrained,
    Trained,
    Tested,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Untrained => "untrained",
            RunState::Trained => "trained",
            RunState::Tested => "tested",
        };
        f.write_str(s)
    }
}

/// Values produced by one online step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// Final output of the step.
    pub ensemble: f64,
    pub adjusted: f64,
    pub combiner: f64,
    pub base: Vec<f64>,
}

/// Per-step outputs of a test pass, before any inverse transform.
struct StepSeries {
    ensemble: Array1<f64>,
    adjusted: Array1<f64>,
    combiner: Array1<f64>,
    base: Array2<f64>,
}

/// Fail unless exactly one prediction was collected per truth.
pub fn check_alignment(predictions: usize, truths: usize) -> Result<()> {
    if predictions != truths {
        return Err(EnsembleError::LengthMismatch {
            predictions,
            truths,
        });
    }
    Ok(())
}

/// Combiner plus optional adjuster, evaluated step by step.
pub struct OnlineEnsemble {
    config: RunConfig,
    provider: Arc<DatasetProvider>,
    combiner: Box<dyn Combiner>,
    adjuster: Option<Box<dyn Adjuster>>,
    history: PredictionHistory,
    state: RunState,
    n_base: usize,
}

impl OnlineEnsemble {
    /// Create an ensemble without an adjuster.
    ///
    /// The combiner's base-model count is fixed from here on; every step is
    /// checked against it.
    pub fn new(
        config: RunConfig,
        provider: Arc<DatasetProvider>,
        combiner: Box<dyn Combiner>,
    ) -> Result<Self> {
        config.validate()?;
        let n_base = combiner.base_model_count();
        Ok(Self {
            config,
            provider,
            combiner,
            adjuster: None,
            history: PredictionHistory::new(n_base),
            state: RunState::Untrained,
            n_base,
        })
    }

    /// Attach a second-stage adjuster.
    pub fn with_adjuster(mut self, adjuster: Box<dyn Adjuster>) -> Self {
        self.adjuster = Some(adjuster);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<DatasetProvider> {
        &self.provider
    }

    pub fn history(&self) -> &PredictionHistory {
        &self.history
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn has_adjuster(&self) -> bool {
        self.adjuster.is_some()
    }

    /// Fit the ensemble over the ensemble-train split.
    ///
    /// Trains the combiner first if it reports itself untrained. The history
    /// is replaced, not extended.
    pub fn train(&mut self) -> Result<()> {
        info!(
            combiner = self.combiner.name(),
            adjuster = self.adjuster.as_ref().map(|a| a.name()),
            state = %self.state,
            "training ensemble"
        );

        if !self.combiner.is_trained() {
            let (_, loader) = self.provider.get(&self.config, Split::Train, true)?;
            self.combiner.train(&loader)?;
        }

        let (dataset, loader) = self.provider.get(&self.config, Split::EnsembleTrain, true)?;
        let truths = dataset.truths();

        let mut combiner_preds = Vec::with_capacity(truths.len());
        let mut base: Vec<Vec<f64>> = vec![Vec::with_capacity(truths.len()); self.n_base];
        for batch in loader.iter() {
            let out = self.combiner_step(&batch?, false)?;
            combiner_preds.push(out.prediction);
            for (series, p) in base.iter_mut().zip(out.base_predictions) {
                series.push(p);
            }
        }
        check_alignment(combiner_preds.len(), truths.len())?;

        let combiner_preds = Array1::from(combiner_preds);
        let ensemble = match self.adjuster.as_mut() {
            Some(adjuster) => {
                let adjusted = adjuster.train(truths.view(), combiner_preds.view())?;
                check_alignment(adjusted.len(), truths.len())?;
                adjusted
            }
            None => combiner_preds.clone(),
        };

        self.history = PredictionHistory::from_series(
            truths.to_vec(),
            ensemble.to_vec(),
            ensemble.to_vec(),
            combiner_preds.to_vec(),
            base,
        )?;
        self.state = RunState::Trained;
        info!(steps = self.history.len(), "ensemble trained");
        Ok(())
    }

    /// Predict the single step held by `batch`, then record it.
    ///
    /// The truth is read from the batch but only reaches the combiner and
    /// adjuster for their post-prediction updates.
    pub fn proceed_onestep(&mut self, batch: &Batch, training: bool) -> Result<StepOutput> {
        let b = batch.batch_size();
        if b != 1 {
            return Err(EnsembleError::StepBatchSize { got: b });
        }
        let truth = batch.truth()?;

        let out = self.combiner_step(batch, training)?;
        let adjusted = match self.adjuster.as_mut() {
            Some(adjuster) => adjuster.proceed_onestep(truth, out.prediction, training)?,
            None => out.prediction,
        };
        let ensemble = adjusted;

        self.history.push(StepRecord {
            truth,
            ensemble,
            adjusted,
            combiner: out.prediction,
            base: out.base_predictions.clone(),
        })?;
        trace!(
            step = self.history.len(),
            truth,
            ensemble,
            combiner = out.prediction,
            "step"
        );

        Ok(StepOutput {
            ensemble,
            adjusted,
            combiner: out.prediction,
            base: out.base_predictions,
        })
    }

    /// Run the online protocol over the test split.
    ///
    /// Every step updates the collaborators after predicting. Series are
    /// returned in original units when the data was scaled and
    /// `config.inverse` is set.
    pub fn test(&mut self) -> Result<TestOutcome> {
        let (dataset, loader) = self.provider.get(&self.config, Split::Test, true)?;
        let truths = dataset.truths();
        let n = truths.len();
        info!(steps = n, state = %self.state, "testing ensemble");

        let StepSeries {
            ensemble,
            adjusted,
            combiner,
            base,
        } = self.run_steps(loader.iter(), n)?;

        let inverted = dataset.scaled() && self.config.inverse;
        let (truths, ensemble, adjusted, combiner, base) = if inverted {
            let ds: &SplitDataset = &dataset;
            debug!(features = ds.n_features(), "inverting test series");
            (
                invert_target_series(ds, truths.view())?,
                invert_target_series(ds, ensemble.view())?,
                invert_target_series(ds, adjusted.view())?,
                invert_target_series(ds, combiner.view())?,
                invert_target_rows(ds, base.view())?,
            )
        } else {
            (truths, ensemble, adjusted, combiner, base)
        };

        self.state = RunState::Tested;
        info!(steps = n, inverted, "ensemble tested");
        Ok(TestOutcome {
            truths,
            ensemble,
            adjusted,
            combiner,
            base,
            base_names: self.combiner.base_model_names(),
            inverted,
        })
    }

    /// Step through `batches` in training mode, filling buffers sized for `n` truths.
    fn run_steps<I>(&mut self, batches: I, n: usize) -> Result<StepSeries>
    where
        I: Iterator<Item = Result<Batch>>,
    {
        let mut series = StepSeries {
            ensemble: Array1::zeros(n),
            adjusted: Array1::zeros(n),
            combiner: Array1::zeros(n),
            base: Array2::zeros((self.n_base, n)),
        };

        let mut steps = 0;
        let mut batches = batches;
        while let Some(batch) = batches.next() {
            let batch = batch?;
            if steps == n {
                return Err(EnsembleError::LengthMismatch {
                    predictions: n + 1 + batches.count(),
                    truths: n,
                });
            }
            let out = self.proceed_onestep(&batch, true)?;
            series.ensemble[steps] = out.ensemble;
            series.adjusted[steps] = out.adjusted;
            series.combiner[steps] = out.combiner;
            for (i, p) in out.base.into_iter().enumerate() {
                series.base[[i, steps]] = p;
            }
            steps += 1;
        }
        check_alignment(steps, n)?;
        Ok(series)
    }

    fn combiner_step(&mut self, batch: &Batch, training: bool) -> Result<CombinerOutput> {
        let out = self.combiner.proceed_onestep(batch, training)?;
        if out.base_predictions.len() != self.n_base {
            return Err(EnsembleError::DimensionMismatch {
                expected: self.n_base,
                got: out.base_predictions.len(),
            });
        }
        Ok(out)
    }
}

impl fmt::Debug for OnlineEnsemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnlineEnsemble")
            .field("combiner", &self.combiner.name())
            .field("adjuster", &self.adjuster.as_ref().map(|a| a.name()))
            .field("state", &self.state)
            .field("steps", &self.history.len())
            .finish()
    }
}
