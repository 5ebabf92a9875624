//! Run an online ensemble end to end.
//!
//! With a path argument the run configuration is read from that YAML file
//! (`data: TABE_FILE` reads the CSV it names). Without one a synthetic
//! hourly series is generated and fed through the online source.
//!
//! ```text
//! cargo run --example online_ensemble -- run.yaml
//! RUST_LOG=tabe_ensemble=debug cargo run --example online_ensemble
//! ```

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tabe_ensemble::config::{DatasetKind, RunConfig};
use tabe_ensemble::core::SeriesFrame;
use tabe_ensemble::data::DatasetProvider;
use tabe_ensemble::ensemble::OnlineEnsemble;
use tabe_ensemble::logging::init_logging;
use tabe_ensemble::models::{
    BoxedBaseModel, CombinationMethod, Drift, LastValue, ResidualAdjuster, SeasonalNaive,
    WeightedCombiner, WindowAverage,
};
use tabe_ensemble::Result;

fn synthetic_frame(n: usize) -> Result<SeriesFrame> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..n).map(|i| base + Duration::hours(i as i64)).collect();
    let daily = |i: usize| (2.0 * std::f64::consts::PI * i as f64 / 24.0).sin();
    SeriesFrame::from_columns(
        timestamps,
        vec![
            ("load".to_string(), (0..n).map(|i| 5.0 + daily(i + 3)).collect()),
            (
                "OT".to_string(),
                (0..n).map(|i| 40.0 + 0.01 * i as f64 + 6.0 * daily(i)).collect(),
            ),
        ],
    )
}

fn main() -> Result<()> {
    init_logging(false)?;

    let (config, provider) = match std::env::args().nth(1) {
        Some(path) => {
            let config = RunConfig::from_yaml(&path)?;
            let provider = match config.data {
                DatasetKind::File => DatasetProvider::new(),
                DatasetKind::Online => DatasetProvider::with_frame(synthetic_frame(2_000)?),
            };
            (config, provider)
        }
        None => {
            let config = RunConfig {
                data: DatasetKind::Online,
                seq_len: 48,
                label_len: 24,
                inverse: true,
                ..RunConfig::default()
            };
            (config, DatasetProvider::with_frame(synthetic_frame(2_000)?))
        }
    };
    println!("run: {config}");

    let models: Vec<BoxedBaseModel> = vec![
        Box::new(LastValue::new()),
        Box::new(WindowAverage::new(6)),
        Box::new(Drift::new()),
        Box::new(SeasonalNaive::new(24)?),
    ];
    let combiner =
        WeightedCombiner::new(models).with_method(CombinationMethod::InverseMse { discount: 0.95 });

    let quantile = config.quantile;
    let buy_prob = config.buy_threshold_prob;
    let mut ensemble = OnlineEnsemble::new(config, Arc::new(provider), Box::new(combiner))?
        .with_adjuster(Box::new(ResidualAdjuster::new(0.1)?));

    ensemble.train()?;
    let outcome = ensemble.test()?;

    println!("{}", outcome.report()?);
    let (lower, upper) = outcome.quantile_band(quantile)?;
    let threshold = outcome.buy_threshold(buy_prob)?;
    let inside = outcome
        .truths
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .filter(|(y, (lo, hi))| lo <= y && y <= hi)
        .count();
    println!(
        "{inside}/{} truths inside the {:.1}% band; last buy threshold {:.3}",
        outcome.len(),
        quantile * 100.0,
        threshold[threshold.len() - 1]
    );
    Ok(())
}
