//! SeriesFrame: timestamped multivariate observations.

use crate::config::FeatureMode;
use crate::error::{EnsembleError, Result};
use chrono::{DateTime, Utc};
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};
use std::ops::Range;

/// Timestamped observations stored row-major: `values[[time, column]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFrame {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl SeriesFrame {
    /// Create a frame, validating shape and timestamp order.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(EnsembleError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.nrows() != timestamps.len() {
            return Err(EnsembleError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.nrows(),
            });
        }
        if values.ncols() != columns.len() {
            return Err(EnsembleError::DimensionMismatch {
                expected: columns.len(),
                got: values.ncols(),
            });
        }

        Ok(Self {
            timestamps,
            columns,
            values,
        })
    }

    /// Build a frame from named column vectors.
    pub fn from_columns(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self> {
        let n = timestamps.len();
        let mut values = Array2::zeros((n, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, data)) in columns.into_iter().enumerate() {
            if data.len() != n {
                return Err(EnsembleError::DimensionMismatch {
                    expected: n,
                    got: data.len(),
                });
            }
            values.column_mut(j).assign(&ArrayView1::from(&data));
            names.push(name);
        }
        Self::new(timestamps, names, values)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| EnsembleError::Configuration(format!("unknown column '{name}'")))?;
        Ok(self.values.column(idx))
    }

    /// Arrange columns for a feature mode, target last.
    ///
    /// `M`/`MS` keep every column with the target moved to the end; `S` keeps
    /// the target alone.
    pub fn arrange_for(&self, mode: FeatureMode, target: &str) -> Result<SeriesFrame> {
        let target_idx = self
            .column_index(target)
            .ok_or_else(|| EnsembleError::Configuration(format!("unknown target '{target}'")))?;

        let order: Vec<usize> = match mode {
            FeatureMode::S => vec![target_idx],
            FeatureMode::M | FeatureMode::MS => (0..self.n_columns())
                .filter(|&j| j != target_idx)
                .chain(std::iter::once(target_idx))
                .collect(),
        };

        Ok(SeriesFrame {
            timestamps: self.timestamps.clone(),
            columns: order.iter().map(|&j| self.columns[j].clone()).collect(),
            values: self.values.select(Axis(1), &order),
        })
    }

    /// Copy a contiguous range of rows.
    pub fn slice_rows(&self, rows: Range<usize>) -> Result<SeriesFrame> {
        if rows.end > self.len() || rows.start > rows.end {
            return Err(EnsembleError::IndexOutOfBounds {
                index: rows.end,
                size: self.len(),
            });
        }
        Ok(SeriesFrame {
            timestamps: self.timestamps[rows.clone()].to_vec(),
            columns: self.columns.clone(),
            values: self.values.slice(s![rows, ..]).to_owned(),
        })
    }
}
