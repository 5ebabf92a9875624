//! Online ensemble engine: orchestration, history and evaluation.

pub mod history;
pub mod inverse;
pub mod orchestrator;
pub mod report;

pub use history::{PredictionHistory, StepRecord};
pub use inverse::{invert_target_rows, invert_target_series};
pub use orchestrator::{check_alignment, OnlineEnsemble, RunState, StepOutput};
pub use report::{EnsembleReport, TestOutcome};
