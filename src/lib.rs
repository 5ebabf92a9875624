//! # tabe-ensemble
//!
//! Online time-series ensembles evaluated strictly step by step.
//!
//! A combiner merges the predictions of several base models and an optional
//! adjuster corrects the combined prediction. Each step is predicted before
//! its truth is revealed; the truth then updates the collaborators before the
//! next step. Datasets and loaders are built once per split and shared
//! through a [`data::DatasetProvider`].

#![allow(clippy::type_complexity)]

pub mod config;
pub mod core;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod logging;
pub mod models;
pub mod utils;

pub use error::{EnsembleError, Result};

pub mod prelude {
    pub use crate::config::{RunConfig, TaskKind};
    pub use crate::core::{Batch, SeriesFrame};
    pub use crate::data::{Dataset, DatasetProvider, Split};
    pub use crate::ensemble::{OnlineEnsemble, RunState, TestOutcome};
    pub use crate::error::{EnsembleError, Result};
    pub use crate::models::{Adjuster, BaseModel, Combiner, ResidualAdjuster, WeightedCombiner};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
