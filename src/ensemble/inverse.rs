//! Mapping target-only series back to original units.
//!
//! The scaler only accepts full-width rows, so a lone target series is
//! embedded into an all-zero matrix at the target column, inverse-transformed
//! and read back out. This is exact for per-column scalers.

use crate::data::Dataset;
use crate::error::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Inverse-transform one target series.
pub fn invert_target_series<D: Dataset + ?Sized>(
    dataset: &D,
    series: ArrayView1<'_, f64>,
) -> Result<Array1<f64>> {
    let target = dataset.target_index();
    let mut full = Array2::zeros((series.len(), dataset.n_features()));
    full.column_mut(target).assign(&series);
    let restored = dataset.inverse_transform(full.view())?;
    Ok(restored.column(target).to_owned())
}

/// Inverse-transform every row of `rows` independently.
pub fn invert_target_rows<D: Dataset + ?Sized>(
    dataset: &D,
    rows: ArrayView2<'_, f64>,
) -> Result<Array2<f64>> {
    let mut out = Array2::zeros(rows.raw_dim());
    for (mut dst, src) in out.axis_iter_mut(Axis(0)).zip(rows.axis_iter(Axis(0))) {
        dst.assign(&invert_target_series(dataset, src)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureMode, RunConfig, ScalerKind};
    use crate::core::SeriesFrame;
    use crate::data::{FittedScaler, ForecastDataset};
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};
    use ndarray::array;

    fn scaled_dataset(kind: ScalerKind) -> (ForecastDataset, SeriesFrame) {
        let n = 40;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..n).map(|i| base + Duration::hours(i as i64)).collect();
        let frame = SeriesFrame::from_columns(
            timestamps,
            vec![
                ("OT".to_string(), (0..n).map(|i| 50.0 + 3.0 * i as f64).collect()),
                ("load".to_string(), (0..n).map(|i| (i % 4) as f64 * 10.0).collect()),
            ],
        )
        .unwrap()
        .arrange_for(FeatureMode::MS, "OT")
        .unwrap();
        let config = RunConfig {
            seq_len: 5,
            label_len: 0,
            ..RunConfig::default()
        };
        let scaler = FittedScaler::fit(kind, frame.values()).unwrap();
        (
            ForecastDataset::new(&frame, &config, Some(scaler)).unwrap(),
            frame,
        )
    }

    #[test]
    fn embedded_series_matches_full_inverse() {
        for kind in [ScalerKind::Standard, ScalerKind::MinMax] {
            let (ds, frame) = scaled_dataset(kind);
            let full = ds.inverse_transform(ds.data_y()).unwrap();
            let alone = invert_target_series(&ds, ds.target_series().view()).unwrap();

            for (i, v) in alone.iter().enumerate() {
                assert_relative_eq!(*v, full[[i, 1]], epsilon = 1e-9);
                assert_relative_eq!(*v, frame.values()[[i, 1]], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn truths_invert_to_raw_values() {
        let (ds, frame) = scaled_dataset(ScalerKind::Standard);
        let restored = invert_target_series(&ds, ds.truths().view()).unwrap();
        assert_eq!(restored.len(), 35);
        assert_relative_eq!(restored[0], frame.values()[[5, 1]], epsilon = 1e-9);
    }

    #[test]
    fn rows_are_inverted_independently() {
        let (ds, _) = scaled_dataset(ScalerKind::MinMax);
        let rows = array![[0.0, 1.0], [0.5, 0.5]];
        let out = invert_target_rows(&ds, rows.view()).unwrap();
        // OT spans 50..=167 over the frame
        assert_relative_eq!(out[[0, 0]], 50.0, epsilon = 1e-9);
        assert_relative_eq!(out[[0, 1]], 167.0, epsilon = 1e-9);
        assert_relative_eq!(out[[1, 0]], 108.5, epsilon = 1e-9);
    }
}
