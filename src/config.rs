//! Run configuration.
//!
//! A [`RunConfig`] is built once per run and treated as immutable afterwards;
//! the dataset provider memoizes on the assumption that it never changes.
//! Identifiers that used to be looked up in a string registry (dataset kind,
//! task kind, time encoding, ...) are closed enums here, so an unknown name is
//! rejected while the configuration is parsed rather than at first use.

use crate::error::{EnsembleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where raw series data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatasetKind {
    /// CSV file at `root_path/data_path`.
    #[default]
    #[serde(rename = "TABE_FILE")]
    File,
    /// Frame supplied in memory by the caller.
    #[serde(rename = "TABE_ONLINE")]
    Online,
}

impl FromStr for DatasetKind {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TABE_FILE" => Ok(Self::File),
            "TABE_ONLINE" => Ok(Self::Online),
            other => Err(EnsembleError::Configuration(format!(
                "unknown dataset '{other}'"
            ))),
        }
    }
}

/// Task the datasets are windowed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    LongTermForecast,
    ShortTermForecast,
    AnomalyDetection,
    Classification,
}

impl TaskKind {
    pub fn is_forecast(&self) -> bool {
        matches!(self, Self::LongTermForecast | Self::ShortTermForecast)
    }
}

impl FromStr for TaskKind {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "long_term_forecast" => Ok(Self::LongTermForecast),
            "short_term_forecast" => Ok(Self::ShortTermForecast),
            "anomaly_detection" => Ok(Self::AnomalyDetection),
            "classification" => Ok(Self::Classification),
            other => Err(EnsembleError::Configuration(format!(
                "unknown task '{other}'"
            ))),
        }
    }
}

/// Encoding of timestamp-derived features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeEncoding {
    /// Continuous features normalised to [-0.5, 0.5].
    #[default]
    #[serde(rename = "timeF")]
    TimeF,
    /// Raw calendar fields (month, day, weekday, hour, ...).
    #[serde(rename = "fixed")]
    Fixed,
    /// Same columns as `Fixed`; the embedding is learned downstream.
    #[serde(rename = "learned")]
    Learned,
}

impl TimeEncoding {
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::TimeF)
    }
}

/// Sampling frequency of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "s")]
    Secondly,
    #[serde(rename = "t")]
    Minutely,
    #[default]
    #[serde(rename = "h")]
    Hourly,
    #[serde(rename = "d")]
    Daily,
    #[serde(rename = "b")]
    BusinessDaily,
    #[serde(rename = "w")]
    Weekly,
    #[serde(rename = "m")]
    Monthly,
}

/// Which columns feed the model and which are predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureMode {
    /// Multivariate in, multivariate out.
    M,
    /// Target only.
    S,
    /// Multivariate in, target out.
    #[default]
    MS,
}

/// Scaler fitted on the training split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    #[default]
    Standard,
    MinMax,
}

/// Chronological split proportions: `train | ensemble_train | val | test`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub train: f64,
    pub ensemble_train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.5,
            ensemble_train: 0.2,
            val: 0.1,
            test: 0.2,
        }
    }
}

impl SplitRatios {
    pub fn new(train: f64, ensemble_train: f64, val: f64, test: f64) -> Self {
        Self {
            train,
            ensemble_train,
            val,
            test,
        }
    }

    fn validate(&self) -> Result<()> {
        let parts = [self.train, self.ensemble_train, self.val, self.test];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(EnsembleError::Configuration(
                "split ratios must be finite and non-negative".to_string(),
            ));
        }
        if self.train <= 0.0 || self.ensemble_train <= 0.0 || self.test <= 0.0 {
            return Err(EnsembleError::Configuration(
                "train, ensemble_train and test ratios must be positive".to_string(),
            ));
        }
        let total: f64 = parts.iter().sum();
        if total > 1.0 + 1e-9 {
            return Err(EnsembleError::Configuration(format!(
                "split ratios sum to {total:.3}, expected at most 1"
            )));
        }
        Ok(())
    }
}

/// Immutable parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data: DatasetKind,
    pub root_path: PathBuf,
    pub data_path: String,
    pub task_name: TaskKind,
    pub embed: TimeEncoding,
    pub freq: Frequency,
    pub batch_size: usize,
    pub num_workers: usize,
    pub seq_len: usize,
    pub label_len: usize,
    pub pred_len: usize,
    pub features: FeatureMode,
    pub target: String,
    pub seasonal_patterns: String,
    pub scale: bool,
    pub scaler: ScalerKind,
    pub inverse: bool,
    pub splits: SplitRatios,
    /// Quantile for reporting bands; passed through untouched by the engine.
    pub quantile: f64,
    /// Probability for the buy-threshold band; reporting only.
    pub buy_threshold_prob: f64,
    /// Seed for shuffled (non-stepwise) loaders.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data: DatasetKind::File,
            root_path: PathBuf::from("dataset"),
            data_path: "data.csv".to_string(),
            task_name: TaskKind::LongTermForecast,
            embed: TimeEncoding::TimeF,
            freq: Frequency::Hourly,
            batch_size: 32,
            num_workers: 0,
            seq_len: 96,
            label_len: 48,
            pred_len: 1,
            features: FeatureMode::MS,
            target: "OT".to_string(),
            seasonal_patterns: "Monthly".to_string(),
            scale: true,
            scaler: ScalerKind::Standard,
            inverse: false,
            splits: SplitRatios::default(),
            quantile: 0.975,
            buy_threshold_prob: 0.75,
            seed: 2024,
        }
    }
}

impl RunConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.seq_len == 0 {
            return Err(EnsembleError::Configuration(
                "seq_len must be positive".to_string(),
            ));
        }
        if self.task_name.is_forecast() {
            if self.pred_len == 0 {
                return Err(EnsembleError::Configuration(
                    "pred_len must be positive".to_string(),
                ));
            }
            if self.label_len > self.seq_len {
                return Err(EnsembleError::Configuration(format!(
                    "label_len ({}) cannot exceed seq_len ({})",
                    self.label_len, self.seq_len
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(EnsembleError::Configuration(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.target.is_empty() {
            return Err(EnsembleError::Configuration(
                "target column must be named".to_string(),
            ));
        }
        for (name, p) in [
            ("quantile", self.quantile),
            ("buy_threshold_prob", self.buy_threshold_prob),
        ] {
            if !(p > 0.0 && p < 1.0) {
                return Err(EnsembleError::Configuration(format!(
                    "{name} must lie in (0, 1), got {p}"
                )));
            }
        }
        self.splits.validate()
    }

    /// Full path of the CSV source.
    pub fn data_file(&self) -> PathBuf {
        self.root_path.join(&self.data_path)
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?} target={} seq_len={} label_len={} pred_len={} features={:?}",
            self.data,
            self.task_name,
            self.target,
            self.seq_len,
            self.label_len,
            self.pred_len,
            self.features
        )
    }
}
