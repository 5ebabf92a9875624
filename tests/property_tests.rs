//! Property-based tests for the data pipeline and the online protocol.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated series and run parameters.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;
use tabe_ensemble::config::{DatasetKind, RunConfig, ScalerKind};
use tabe_ensemble::core::SeriesFrame;
use tabe_ensemble::data::{Dataset, DatasetProvider, Split};
use tabe_ensemble::ensemble::{invert_target_series, OnlineEnsemble};
use tabe_ensemble::models::{BoxedBaseModel, Drift, LastValue, WeightedCombiner, WindowAverage};

/// Two-column frame with the given target values.
fn make_frame(target: &[f64]) -> SeriesFrame {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..target.len())
        .map(|i| base + Duration::hours(i as i64))
        .collect();
    SeriesFrame::from_columns(
        timestamps,
        vec![
            (
                "aux".to_string(),
                (0..target.len()).map(|i| (i % 13) as f64).collect(),
            ),
            ("OT".to_string(), target.to_vec()),
        ],
    )
    .unwrap()
}

fn online_config(seq_len: usize, batch_size: usize) -> RunConfig {
    RunConfig {
        data: DatasetKind::Online,
        seq_len,
        label_len: seq_len / 2,
        batch_size,
        ..RunConfig::default()
    }
}

/// Strategy for generating target values.
/// Adds small variation to avoid all-constant series.
fn target_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(-500.0..500.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

fn split_strategy() -> impl Strategy<Value = Split> {
    prop_oneof![
        Just(Split::Train),
        Just(Split::EnsembleTrain),
        Just(Split::Val),
        Just(Split::Test),
    ]
}

// =============================================================================
// Property: cache idempotence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn provider_returns_one_identity_per_key(
        target in target_strategy(300, 400),
        requests in prop::collection::vec((split_strategy(), any::<bool>()), 1..20),
    ) {
        let cfg = online_config(8, 16);
        let provider = DatasetProvider::with_frame(make_frame(&target));
        let mut first = std::collections::HashMap::new();

        for (split, stepwise) in requests {
            let (dataset, loader) = provider.get(&cfg, split, stepwise).unwrap();
            let (d0, l0) = first
                .entry((split, stepwise))
                .or_insert_with(|| (Arc::clone(&dataset), Arc::clone(&loader)));
            prop_assert!(Arc::ptr_eq(d0, &dataset));
            prop_assert!(Arc::ptr_eq(l0, &loader));
        }
        prop_assert_eq!(provider.len(), first.len());
    }
}

// =============================================================================
// Property: stepwise loaders are chronological with one window per batch
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn stepwise_loader_never_shuffles(
        target in target_strategy(200, 300),
        batch_size in 1usize..64,
        seed in any::<u64>(),
        split in split_strategy(),
    ) {
        let cfg = RunConfig { seed, ..online_config(6, batch_size) };
        let provider = DatasetProvider::with_frame(make_frame(&target));
        let (dataset, loader) = provider.get(&cfg, split, true).unwrap();

        let mut count = 0;
        for (t, batch) in loader.iter().enumerate() {
            let batch = batch.unwrap();
            prop_assert_eq!(batch.batch_size(), 1);
            prop_assert_eq!(batch.indices[0], t);
            count += 1;
        }
        prop_assert_eq!(count, dataset.truths().len());
    }

    #[test]
    fn forecast_window_count_follows_lengths(
        target in target_strategy(120, 200),
        seq_len in 2usize..20,
        pred_len in 1usize..4,
    ) {
        let cfg = RunConfig { pred_len, ..online_config(seq_len, 8) };
        let provider = DatasetProvider::with_frame(make_frame(&target));
        let (dataset, _) = provider.get(&cfg, Split::Train, true).unwrap();
        let rows = dataset.data_y().nrows();
        prop_assert_eq!(dataset.len(), rows + 1 - seq_len - pred_len);
        prop_assert_eq!(dataset.truths().len(), dataset.len());
    }
}

// =============================================================================
// Property: inverse-transform consistency
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn embedded_inverse_recovers_raw_target(
        target in target_strategy(150, 250),
        minmax in any::<bool>(),
    ) {
        let scaler = if minmax { ScalerKind::MinMax } else { ScalerKind::Standard };
        let cfg = RunConfig { scaler, ..online_config(10, 8) };
        let provider = DatasetProvider::with_frame(make_frame(&target));
        let (dataset, _) = provider.get(&cfg, Split::Test, true).unwrap();

        let restored = invert_target_series(&*dataset, dataset.target_series().view()).unwrap();
        let offset = target.len() - restored.len();
        for (i, v) in restored.iter().enumerate() {
            let raw = target[offset + i];
            prop_assert!((v - raw).abs() < 1e-6 * raw.abs().max(1.0), "{} vs {}", v, raw);
        }
    }
}

// =============================================================================
// Property: history length invariant and adjuster bypass
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn history_stays_in_lockstep(
        target in target_strategy(200, 320),
        seq_len in 3usize..16,
    ) {
        let models: Vec<BoxedBaseModel> = vec![
            Box::new(LastValue::new()),
            Box::new(WindowAverage::new(3)),
            Box::new(Drift::new()),
        ];
        let provider = Arc::new(DatasetProvider::with_frame(make_frame(&target)));
        let mut ens = OnlineEnsemble::new(
            online_config(seq_len, 32),
            provider,
            Box::new(WeightedCombiner::new(models)),
        )
        .unwrap();

        ens.train().unwrap();
        let trained = ens.history().len();
        let outcome = ens.test().unwrap();

        let h = ens.history();
        prop_assert_eq!(h.len(), trained + outcome.len());
        prop_assert_eq!(h.ensemble().len(), h.len());
        prop_assert_eq!(h.combiner().len(), h.len());
        prop_assert_eq!(h.ensemble(), h.combiner());
        prop_assert_eq!(&outcome.ensemble, &outcome.combiner);
    }
}
