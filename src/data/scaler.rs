//! Per-column scaling with an inverse transform.
//!
//! A scaler is fit on the training split's full feature matrix. Both
//! directions are only defined for that exact feature width: a matrix with a
//! different number of columns is rejected rather than broadcast.

use crate::config::ScalerKind;
use crate::error::{EnsembleError, Result};
use ndarray::{Array2, ArrayView2, Axis};

/// Fitted per-column parameters: `x_scaled = (x - center) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedScaler {
    kind: ScalerKind,
    center: Vec<f64>,
    scale: Vec<f64>,
}

impl FittedScaler {
    /// Fit on an `N × F` matrix.
    ///
    /// `Standard` uses mean and population standard deviation; `MinMax` maps
    /// each column's observed range onto [0, 1]. Constant columns get a scale
    /// of 1.0.
    pub fn fit(kind: ScalerKind, data: ArrayView2<'_, f64>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(EnsembleError::EmptyData);
        }

        let mut center = Vec::with_capacity(data.ncols());
        let mut scale = Vec::with_capacity(data.ncols());

        for column in data.axis_iter(Axis(1)) {
            let (c, s) = match kind {
                ScalerKind::Standard => {
                    let n = column.len() as f64;
                    let mean = column.sum() / n;
                    let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
                    (mean, variance.sqrt())
                }
                ScalerKind::MinMax => {
                    let min = column.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    (min, max - min)
                }
            };
            if !c.is_finite() || !s.is_finite() {
                return Err(EnsembleError::ComputationError(
                    "non-finite values in scaler fit data".to_string(),
                ));
            }
            center.push(c);
            scale.push(if s < 1e-10 { 1.0 } else { s });
        }

        Ok(Self {
            kind,
            center,
            scale,
        })
    }

    /// Build from known parameters.
    pub fn from_parts(kind: ScalerKind, center: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if center.len() != scale.len() {
            return Err(EnsembleError::DimensionMismatch {
                expected: center.len(),
                got: scale.len(),
            });
        }
        if scale.iter().any(|s| s.abs() < 1e-10) {
            return Err(EnsembleError::InvalidParameter(
                "scale must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            kind,
            center,
            scale,
        })
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    /// Width the scaler was fit on.
    pub fn n_features(&self) -> usize {
        self.center.len()
    }

    pub fn center(&self) -> &[f64] {
        &self.center
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Apply the fitted scaling.
    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (c, s) = (self.center[j], self.scale[j]);
            column.mapv_inplace(|x| (x - c) / s);
        }
        Ok(out)
    }

    /// Recover original units.
    pub fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (c, s) = (self.center[j], self.scale[j]);
            column.mapv_inplace(|x| x * s + c);
        }
        Ok(out)
    }

    fn check_width(&self, data: ArrayView2<'_, f64>) -> Result<()> {
        if data.ncols() != self.n_features() {
            return Err(EnsembleError::DimensionMismatch {
                expected: self.n_features(),
                got: data.ncols(),
            });
        }
        Ok(())
    }
}
