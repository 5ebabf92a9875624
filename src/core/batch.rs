//! Windows and the batches a loader yields.

use crate::error::{EnsembleError, Result};
use ndarray::{s, stack, Array2, Array3, ArrayView2, Axis};

/// One sample drawn from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Position of the window within its dataset.
    pub index: usize,
    /// Input rows, `seq_len × F`.
    pub x: Array2<f64>,
    /// Target rows; the last row's last column is the truth.
    pub y: Array2<f64>,
    /// Time features of the input rows.
    pub x_mark: Array2<f64>,
    /// Time features of the target rows.
    pub y_mark: Array2<f64>,
}

impl Window {
    /// The value revealed after this window's prediction.
    pub fn truth(&self) -> Result<f64> {
        last_cell(self.y.view())
    }
}

fn last_cell(m: ArrayView2<'_, f64>) -> Result<f64> {
    let (rows, cols) = m.dim();
    if rows == 0 || cols == 0 {
        return Err(EnsembleError::EmptyData);
    }
    Ok(m[[rows - 1, cols - 1]])
}

/// Windows stacked along a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Dataset positions of the stacked windows, in yield order.
    pub indices: Vec<usize>,
    pub x: Array3<f64>,
    pub y: Array3<f64>,
    pub x_mark: Array3<f64>,
    pub y_mark: Array3<f64>,
    /// `1.0` for observed input rows, `0.0` for padding (padded batches only).
    pub padding_mask: Option<Array2<f64>>,
}

impl Batch {
    /// Stack equally shaped windows.
    pub fn stack(windows: &[Window]) -> Result<Self> {
        if windows.is_empty() {
            return Err(EnsembleError::EmptyData);
        }
        let xs: Vec<_> = windows.iter().map(|w| w.x.view()).collect();
        let ys: Vec<_> = windows.iter().map(|w| w.y.view()).collect();
        let xms: Vec<_> = windows.iter().map(|w| w.x_mark.view()).collect();
        let yms: Vec<_> = windows.iter().map(|w| w.y_mark.view()).collect();

        Ok(Self {
            indices: windows.iter().map(|w| w.index).collect(),
            x: stack(Axis(0), &xs)?,
            y: stack(Axis(0), &ys)?,
            x_mark: stack(Axis(0), &xms)?,
            y_mark: stack(Axis(0), &yms)?,
            padding_mask: None,
        })
    }

    /// Stack variable-length windows, truncating or zero-padding inputs to `max_len` rows.
    ///
    /// Truncation keeps the most recent rows. Padding is appended after the
    /// observed rows and recorded in the padding mask.
    pub fn collate_padded(windows: &[Window], max_len: usize) -> Result<Self> {
        if windows.is_empty() {
            return Err(EnsembleError::EmptyData);
        }
        if max_len == 0 {
            return Err(EnsembleError::InvalidParameter(
                "max_len must be positive".to_string(),
            ));
        }

        let b = windows.len();
        let n_features = windows[0].x.ncols();
        let n_marks = windows[0].x_mark.ncols();
        let mut x = Array3::zeros((b, max_len, n_features));
        let mut x_mark = Array3::zeros((b, max_len, n_marks));
        let mut mask = Array2::zeros((b, max_len));

        for (i, w) in windows.iter().enumerate() {
            if w.x.ncols() != n_features {
                return Err(EnsembleError::DimensionMismatch {
                    expected: n_features,
                    got: w.x.ncols(),
                });
            }
            let len = w.x.nrows();
            let keep = len.min(max_len);
            let start = len - keep;
            x.slice_mut(s![i, ..keep, ..])
                .assign(&w.x.slice(s![start.., ..]));
            if w.x_mark.nrows() == len && w.x_mark.ncols() == n_marks {
                x_mark
                    .slice_mut(s![i, ..keep, ..])
                    .assign(&w.x_mark.slice(s![start.., ..]));
            }
            mask.slice_mut(s![i, ..keep]).fill(1.0);
        }

        let ys: Vec<_> = windows.iter().map(|w| w.y.view()).collect();
        let yms: Vec<_> = windows.iter().map(|w| w.y_mark.view()).collect();

        Ok(Self {
            indices: windows.iter().map(|w| w.index).collect(),
            x,
            y: stack(Axis(0), &ys)?,
            x_mark,
            y_mark: stack(Axis(0), &yms)?,
            padding_mask: Some(mask),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    /// Truth of a single-window batch: last step, last feature of `y`.
    pub fn truth(&self) -> Result<f64> {
        let b = self.batch_size();
        if b != 1 {
            return Err(EnsembleError::StepBatchSize { got: b });
        }
        last_cell(self.y.index_axis(Axis(0), 0))
    }

    /// Overwrite the truth of a single-window batch.
    pub fn replace_truth(&mut self, value: f64) -> Result<()> {
        let b = self.batch_size();
        if b != 1 {
            return Err(EnsembleError::StepBatchSize { got: b });
        }
        let (_, rows, cols) = self.y.dim();
        if rows == 0 || cols == 0 {
            return Err(EnsembleError::EmptyData);
        }
        self.y[[0, rows - 1, cols - 1]] = value;
        Ok(())
    }

    /// Observed input values of the target (last) column for one item.
    pub fn target_input(&self, item: usize) -> Result<Vec<f64>> {
        let (b, rows, cols) = self.x.dim();
        if item >= b {
            return Err(EnsembleError::IndexOutOfBounds {
                index: item,
                size: b,
            });
        }
        if cols == 0 {
            return Err(EnsembleError::EmptyData);
        }
        let observed = match &self.padding_mask {
            Some(mask) => mask.row(item).iter().filter(|&&m| m > 0.0).count(),
            None => rows,
        };
        Ok(self
            .x
            .slice(s![item, ..observed, cols - 1])
            .iter()
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn window(index: usize, rows: usize) -> Window {
        let x = Array2::from_shape_fn((rows, 2), |(r, c)| (index + r) as f64 + c as f64 * 0.5);
        Window {
            index,
            x,
            y: array![[0.0, index as f64 + 100.0]],
            x_mark: Array2::zeros((rows, 0)),
            y_mark: Array2::zeros((1, 0)),
        }
    }

    #[test]
    fn stack_builds_leading_axis() {
        let batch = Batch::stack(&[window(0, 3), window(1, 3)]).unwrap();
        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.x.dim(), (2, 3, 2));
        assert_eq!(batch.indices, vec![0, 1]);
    }

    #[test]
    fn stack_rejects_ragged_windows() {
        assert!(Batch::stack(&[window(0, 3), window(1, 2)]).is_err());
        assert!(Batch::stack(&[]).is_err());
    }

    #[test]
    fn truth_requires_single_window() {
        let single = Batch::stack(&[window(4, 3)]).unwrap();
        assert_eq!(single.truth().unwrap(), 104.0);

        let double = Batch::stack(&[window(0, 3), window(1, 3)]).unwrap();
        assert_eq!(
            double.truth().unwrap_err(),
            EnsembleError::StepBatchSize { got: 2 }
        );
    }

    #[test]
    fn replace_truth_only_touches_last_cell() {
        let mut batch = Batch::stack(&[window(2, 3)]).unwrap();
        let x_before = batch.x.clone();
        batch.replace_truth(-1e9).unwrap();
        assert_eq!(batch.truth().unwrap(), -1e9);
        assert_eq!(batch.x, x_before);
    }

    #[test]
    fn collate_pads_and_truncates() {
        let batch = Batch::collate_padded(&[window(0, 2), window(1, 5)], 3).unwrap();
        let mask = batch.padding_mask.as_ref().unwrap();
        assert_eq!(batch.x.dim(), (2, 3, 2));
        assert_eq!(mask.row(0).to_vec(), vec![1.0, 1.0, 0.0]);
        assert_eq!(mask.row(1).to_vec(), vec![1.0, 1.0, 1.0]);
        // Truncation keeps the most recent rows: indices 2..5 of window(1)
        assert_eq!(batch.x[[1, 0, 0]], 3.0);
        assert_eq!(batch.x[[0, 2, 0]], 0.0);
    }

    #[test]
    fn target_input_respects_padding() {
        let batch = Batch::collate_padded(&[window(0, 2)], 4).unwrap();
        assert_eq!(batch.target_input(0).unwrap(), vec![0.5, 1.5]);
        assert!(batch.target_input(1).is_err());
    }
}
