//! Windowed datasets over one split.
//!
//! Each task kind windows the same scaled split matrix differently. The set
//! of kinds is closed: [`SplitDataset`] dispatches over them with a `match`
//! instead of looking a constructor up by name.

use crate::config::{RunConfig, TaskKind};
use crate::core::{SeriesFrame, Window};
use crate::data::scaler::FittedScaler;
use crate::data::split::{own_rows, split_borders, Split};
use crate::data::time_features::time_features;
use crate::error::{EnsembleError, Result};
use chrono::{DateTime, Utc};
use ndarray::{s, Array1, Array2, ArrayView2};

/// Read-only view every dataset offers to loaders and the orchestrator.
///
/// The target is always the last column of [`Dataset::data_y`].
pub trait Dataset {
    /// Number of windows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Window at `index`, `0 <= index < len()`.
    fn get(&self, index: usize) -> Result<Window>;

    /// Split matrix (scaled when the dataset is scaled), `rows × F`.
    fn data_y(&self) -> ArrayView2<'_, f64>;

    /// Timestamps of the split rows.
    fn timestamps(&self) -> &[DateTime<Utc>];

    /// Truths in window order: one per window.
    fn truths(&self) -> Array1<f64>;

    /// Whether values are in scaled units.
    fn scaled(&self) -> bool;

    /// Map an `N × F` matrix back to original units.
    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    fn n_features(&self) -> usize {
        self.data_y().ncols()
    }

    fn target_index(&self) -> usize {
        self.n_features().saturating_sub(1)
    }

    /// Whole target column of the split.
    fn target_series(&self) -> Array1<f64> {
        self.data_y().column(self.target_index()).to_owned()
    }
}

/// Rows of one split plus the scaler that produced them.
#[derive(Debug, Clone)]
struct SplitRows {
    timestamps: Vec<DateTime<Utc>>,
    data: Array2<f64>,
    marks: Array2<f64>,
    scaler: Option<FittedScaler>,
}

impl SplitRows {
    fn new(frame: &SeriesFrame, config: &RunConfig, scaler: Option<FittedScaler>) -> Result<Self> {
        let data = match &scaler {
            Some(scaler) => scaler.transform(frame.values())?,
            None => frame.values().to_owned(),
        };
        Ok(Self {
            timestamps: frame.timestamps().to_vec(),
            marks: time_features(frame.timestamps(), config.embed, config.freq),
            data,
            scaler,
        })
    }

    fn rows(&self) -> usize {
        self.data.nrows()
    }

    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match &self.scaler {
            Some(scaler) => scaler.inverse_transform(data),
            None => {
                if data.ncols() != self.data.ncols() {
                    return Err(EnsembleError::DimensionMismatch {
                        expected: self.data.ncols(),
                        got: data.ncols(),
                    });
                }
                Ok(data.to_owned())
            }
        }
    }

    fn check_index(&self, index: usize, len: usize) -> Result<()> {
        if index >= len {
            return Err(EnsembleError::IndexOutOfBounds { index, size: len });
        }
        Ok(())
    }
}

/// Forecast windows: `seq_len` input rows, `label_len + pred_len` target rows.
#[derive(Debug, Clone)]
pub struct ForecastDataset {
    rows: SplitRows,
    seq_len: usize,
    label_len: usize,
    pred_len: usize,
}

impl ForecastDataset {
    /// Window an already-arranged frame (target last).
    pub fn new(frame: &SeriesFrame, config: &RunConfig, scaler: Option<FittedScaler>) -> Result<Self> {
        if config.seq_len == 0 || config.pred_len == 0 {
            return Err(EnsembleError::Configuration(
                "seq_len and pred_len must be positive".to_string(),
            ));
        }
        if config.label_len > config.seq_len {
            return Err(EnsembleError::Configuration(format!(
                "label_len ({}) exceeds seq_len ({})",
                config.label_len, config.seq_len
            )));
        }
        let needed = config.seq_len + config.pred_len;
        if frame.len() < needed {
            return Err(EnsembleError::InsufficientData {
                needed,
                got: frame.len(),
            });
        }
        Ok(Self {
            rows: SplitRows::new(frame, config, scaler)?,
            seq_len: config.seq_len,
            label_len: config.label_len,
            pred_len: config.pred_len,
        })
    }
}

impl Dataset for ForecastDataset {
    fn len(&self) -> usize {
        self.rows.rows() + 1 - self.seq_len - self.pred_len
    }

    fn get(&self, index: usize) -> Result<Window> {
        self.rows.check_index(index, self.len())?;
        let s_end = index + self.seq_len;
        let r_begin = s_end - self.label_len;
        let r_end = s_end + self.pred_len;

        Ok(Window {
            index,
            x: self.rows.data.slice(s![index..s_end, ..]).to_owned(),
            y: self.rows.data.slice(s![r_begin..r_end, ..]).to_owned(),
            x_mark: self.rows.marks.slice(s![index..s_end, ..]).to_owned(),
            y_mark: self.rows.marks.slice(s![r_begin..r_end, ..]).to_owned(),
        })
    }

    fn data_y(&self) -> ArrayView2<'_, f64> {
        self.rows.data.view()
    }

    fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.rows.timestamps
    }

    fn truths(&self) -> Array1<f64> {
        let offset = self.seq_len + self.pred_len - 1;
        self.rows
            .data
            .slice(s![offset.., self.target_index()])
            .to_owned()
    }

    fn scaled(&self) -> bool {
        self.rows.scaler.is_some()
    }

    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.rows.inverse_transform(data)
    }
}

/// Sliding windows of `win_size` rows whose target is the same window shifted
/// one row forward.
///
/// The last target row, the step truth, is never part of the input.
#[derive(Debug, Clone)]
pub struct AnomalyDataset {
    rows: SplitRows,
    win_size: usize,
}

impl AnomalyDataset {
    pub fn new(frame: &SeriesFrame, config: &RunConfig, scaler: Option<FittedScaler>) -> Result<Self> {
        if config.seq_len == 0 {
            return Err(EnsembleError::Configuration(
                "seq_len must be positive".to_string(),
            ));
        }
        let needed = config.seq_len + 1;
        if frame.len() < needed {
            return Err(EnsembleError::InsufficientData {
                needed,
                got: frame.len(),
            });
        }
        Ok(Self {
            rows: SplitRows::new(frame, config, scaler)?,
            win_size: config.seq_len,
        })
    }
}

impl Dataset for AnomalyDataset {
    fn len(&self) -> usize {
        self.rows.rows() - self.win_size
    }

    fn get(&self, index: usize) -> Result<Window> {
        self.rows.check_index(index, self.len())?;
        let s_end = index + self.win_size;
        Ok(Window {
            index,
            x: self.rows.data.slice(s![index..s_end, ..]).to_owned(),
            y: self.rows.data.slice(s![index + 1..=s_end, ..]).to_owned(),
            x_mark: Array2::zeros((self.win_size, 0)),
            y_mark: Array2::zeros((self.win_size, 0)),
        })
    }

    fn data_y(&self) -> ArrayView2<'_, f64> {
        self.rows.data.view()
    }

    fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.rows.timestamps
    }

    fn truths(&self) -> Array1<f64> {
        self.rows
            .data
            .slice(s![self.win_size.., self.target_index()])
            .to_owned()
    }

    fn scaled(&self) -> bool {
        self.rows.scaler.is_some()
    }

    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.rows.inverse_transform(data)
    }
}

/// Trailing histories of up to `max_len` rows labelled with the next-step
/// direction of the target (1.0 up, 0.0 otherwise).
///
/// Early samples are shorter than `max_len`; the loader pads them.
#[derive(Debug, Clone)]
pub struct ClassificationDataset {
    rows: SplitRows,
    max_len: usize,
    labels: Array1<f64>,
}

impl ClassificationDataset {
    pub fn new(frame: &SeriesFrame, config: &RunConfig, scaler: Option<FittedScaler>) -> Result<Self> {
        if frame.len() < 2 {
            return Err(EnsembleError::InsufficientData {
                needed: 2,
                got: frame.len(),
            });
        }
        let rows = SplitRows::new(frame, config, scaler)?;
        let target = rows.data.column(rows.data.ncols() - 1);
        let labels = (0..rows.rows() - 1)
            .map(|i| if target[i + 1] > target[i] { 1.0 } else { 0.0 })
            .collect();
        Ok(Self {
            rows,
            max_len: config.seq_len,
            labels,
        })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Dataset for ClassificationDataset {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Result<Window> {
        self.rows.check_index(index, self.len())?;
        let start = (index + 1).saturating_sub(self.max_len);
        let x = self.rows.data.slice(s![start..=index, ..]).to_owned();
        Ok(Window {
            index,
            x_mark: Array2::zeros((x.nrows(), 0)),
            x,
            y: Array2::from_elem((1, 1), self.labels[index]),
            y_mark: Array2::zeros((1, 0)),
        })
    }

    fn data_y(&self) -> ArrayView2<'_, f64> {
        self.rows.data.view()
    }

    fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.rows.timestamps
    }

    fn truths(&self) -> Array1<f64> {
        self.labels.clone()
    }

    /// Labels are never in scaled units.
    fn scaled(&self) -> bool {
        false
    }

    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.rows.inverse_transform(data)
    }
}

/// Dataset for one split, one variant per task kind.
#[derive(Debug, Clone)]
pub enum SplitDataset {
    Forecast(ForecastDataset),
    Anomaly(AnomalyDataset),
    Classification(ClassificationDataset),
}

impl SplitDataset {
    /// Arrange, scale and window `frame` for `split` according to `config`.
    ///
    /// The scaler is fit on the train split's rows only.
    pub fn build(frame: &SeriesFrame, config: &RunConfig, split: Split) -> Result<Self> {
        let arranged = frame.arrange_for(config.features, &config.target)?;
        let n = arranged.len();

        let scaler = if config.scale {
            let train = own_rows(n, &config.splits, Split::Train)?;
            let fit_rows = arranged.values().slice_move(s![train, ..]);
            Some(FittedScaler::fit(config.scaler, fit_rows)?)
        } else {
            None
        };

        let borders = split_borders(n, &config.splits, config.seq_len, split)?;
        let rows = arranged.slice_rows(borders)?;
        Self::from_frame(&rows, config, scaler)
    }

    /// Window an arranged frame for the configured task.
    pub fn from_frame(
        frame: &SeriesFrame,
        config: &RunConfig,
        scaler: Option<FittedScaler>,
    ) -> Result<Self> {
        Ok(match config.task_name {
            TaskKind::LongTermForecast | TaskKind::ShortTermForecast => {
                SplitDataset::Forecast(ForecastDataset::new(frame, config, scaler)?)
            }
            TaskKind::AnomalyDetection => {
                SplitDataset::Anomaly(AnomalyDataset::new(frame, config, scaler)?)
            }
            TaskKind::Classification => {
                SplitDataset::Classification(ClassificationDataset::new(frame, config, scaler)?)
            }
        })
    }

    /// Padding length for collated batches, if the variant needs one.
    pub fn pad_len(&self) -> Option<usize> {
        match self {
            SplitDataset::Classification(d) => Some(d.max_len()),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Dataset {
        match self {
            SplitDataset::Forecast(d) => d,
            SplitDataset::Anomaly(d) => d,
            SplitDataset::Classification(d) => d,
        }
    }
}

impl Dataset for SplitDataset {
    fn len(&self) -> usize {
        self.inner().len()
    }

    fn get(&self, index: usize) -> Result<Window> {
        self.inner().get(index)
    }

    fn data_y(&self) -> ArrayView2<'_, f64> {
        self.inner().data_y()
    }

    fn timestamps(&self) -> &[DateTime<Utc>] {
        self.inner().timestamps()
    }

    fn truths(&self) -> Array1<f64> {
        self.inner().truths()
    }

    fn scaled(&self) -> bool {
        self.inner().scaled()
    }

    fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.inner().inverse_transform(data)
    }
}
