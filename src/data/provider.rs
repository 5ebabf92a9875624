//! Memoizing provider of (dataset, loader) pairs.
//!
//! A provider is built once per run context and passed to everything that
//! needs data. Entries are created on first request and kept for the
//! provider's lifetime; there is no eviction. The config passed to
//! [`DatasetProvider::get`] must be the same on every call: a hit returns
//! the stored pair even if the config has changed since it was built.

use crate::config::{DatasetKind, RunConfig};
use crate::core::SeriesFrame;
use crate::data::dataset::{Dataset, SplitDataset};
use crate::data::loader::{DataLoader, LoaderOptions};
use crate::data::source::DataSource;
use crate::data::split::Split;
use crate::error::{EnsembleError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Memo key: split plus whether the loader is stepwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub split: Split,
    pub stepwise: bool,
}

impl CacheKey {
    pub fn new(split: Split, stepwise: bool) -> Self {
        Self { split, stepwise }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stepwise {
            write!(f, "{}_stb", self.split)
        } else {
            write!(f, "{}", self.split)
        }
    }
}

/// Shared handles returned by the provider.
pub type ProvidedPair = (Arc<SplitDataset>, Arc<DataLoader>);

#[derive(Debug, Default)]
struct ProviderState {
    frame: Option<Arc<SeriesFrame>>,
    entries: HashMap<CacheKey, ProvidedPair>,
}

/// Builds and memoizes datasets and loaders.
#[derive(Debug)]
pub struct DatasetProvider {
    source: Option<DataSource>,
    state: Mutex<ProviderState>,
}

impl DatasetProvider {
    /// Provider that resolves its source from the config (`TABE_FILE`).
    pub fn new() -> Self {
        Self {
            source: None,
            state: Mutex::new(ProviderState::default()),
        }
    }

    /// Provider over a caller-supplied frame (`TABE_ONLINE`).
    pub fn with_frame(frame: SeriesFrame) -> Self {
        Self::with_source(DataSource::Online(Arc::new(frame)))
    }

    pub fn with_source(source: DataSource) -> Self {
        Self {
            source: Some(source),
            state: Mutex::new(ProviderState::default()),
        }
    }

    /// Return the pair for `(split, stepwise)`, building it on first request.
    ///
    /// The lock is held across construction so concurrent callers observe a
    /// single identity per key. The config is validated on a miss only.
    pub fn get(&self, config: &RunConfig, split: Split, stepwise: bool) -> Result<ProvidedPair> {
        let key = CacheKey::new(split, stepwise);
        let mut state = self.lock();

        if let Some((dataset, loader)) = state.entries.get(&key) {
            return Ok((Arc::clone(dataset), Arc::clone(loader)));
        }
        config.validate()?;

        let frame = match &state.frame {
            Some(frame) => Arc::clone(frame),
            None => {
                let frame = self.resolve_source(config)?.load()?;
                state.frame = Some(Arc::clone(&frame));
                frame
            }
        };

        let dataset = Arc::new(SplitDataset::build(&frame, config, split)?);
        let options = LoaderOptions::for_split(config, split, stepwise, dataset.pad_len());
        let loader = Arc::new(DataLoader::new(Arc::clone(&dataset), options)?);
        debug!(
            key = %key,
            windows = dataset.len(),
            batches = loader.len(),
            "built dataset and loader"
        );

        state
            .entries
            .insert(key, (Arc::clone(&dataset), Arc::clone(&loader)));
        Ok((dataset, loader))
    }

    /// Number of memoized pairs.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, split: Split, stepwise: bool) -> bool {
        self.lock()
            .entries
            .contains_key(&CacheKey::new(split, stepwise))
    }

    fn resolve_source(&self, config: &RunConfig) -> Result<DataSource> {
        match (&self.source, config.data) {
            (Some(source), _) => Ok(source.clone()),
            (None, DatasetKind::File) => Ok(DataSource::File(config.data_file())),
            (None, DatasetKind::Online) => Err(EnsembleError::Configuration(
                "TABE_ONLINE requires a provider built with a frame".to_string(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        // A panic mid-build leaves no partial entry behind, so the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DatasetProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskKind;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;

    fn make_frame(n: usize) -> SeriesFrame {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..n).map(|i| base + Duration::hours(i as i64)).collect();
        SeriesFrame::from_columns(
            timestamps,
            vec![
                ("load".to_string(), (0..n).map(|i| (i % 7) as f64).collect()),
                ("OT".to_string(), (0..n).map(|i| 10.0 + i as f64).collect()),
            ],
        )
        .unwrap()
    }

    fn config() -> RunConfig {
        RunConfig {
            data: DatasetKind::Online,
            seq_len: 8,
            label_len: 4,
            batch_size: 16,
            ..RunConfig::default()
        }
    }

    #[test]
    fn key_display_marks_stepwise() {
        assert_eq!(CacheKey::new(Split::EnsembleTrain, true).to_string(), "ensemble_train_stb");
        assert_eq!(CacheKey::new(Split::Test, false).to_string(), "test");
    }

    #[test]
    fn repeated_requests_share_identity() {
        let provider = DatasetProvider::with_frame(make_frame(200));
        let cfg = config();

        let (d1, l1) = provider.get(&cfg, Split::Test, true).unwrap();
        let (d2, l2) = provider.get(&cfg, Split::Test, true).unwrap();
        assert!(Arc::ptr_eq(&d1, &d2));
        assert!(Arc::ptr_eq(&l1, &l2));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn stepwise_and_batched_are_distinct_entries() {
        let provider = DatasetProvider::with_frame(make_frame(200));
        let cfg = config();

        let (_, stepwise) = provider.get(&cfg, Split::EnsembleTrain, true).unwrap();
        let (_, batched) = provider.get(&cfg, Split::EnsembleTrain, false).unwrap();
        assert!(!Arc::ptr_eq(&stepwise, &batched));
        assert_eq!(stepwise.options().batch_size, 1);
        assert!(!stepwise.options().shuffle);
        assert_eq!(batched.options().batch_size, 16);
        assert!(batched.options().shuffle);
        assert!(provider.contains(Split::EnsembleTrain, true));
        assert!(!provider.contains(Split::Test, true));
    }

    #[test]
    fn test_split_is_never_shuffled() {
        let provider = DatasetProvider::with_frame(make_frame(200));
        let (_, loader) = provider.get(&config(), Split::Test, false).unwrap();
        assert!(!loader.options().shuffle);
        assert_eq!(loader.options().batch_size, 16);
    }

    #[test]
    fn hit_ignores_changed_config() {
        let provider = DatasetProvider::with_frame(make_frame(200));
        let (first, _) = provider.get(&config(), Split::Val, true).unwrap();

        let changed = RunConfig {
            task_name: TaskKind::AnomalyDetection,
            ..config()
        };
        let (second, _) = provider.get(&changed, Split::Val, true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(*second, SplitDataset::Forecast(_)));
    }

    #[test]
    fn online_kind_without_frame_is_rejected() {
        let provider = DatasetProvider::new();
        let err = provider.get(&config(), Split::Train, true).unwrap_err();
        assert!(matches!(err, EnsembleError::Configuration(_)));
        assert!(provider.is_empty());
    }

    #[test]
    fn invalid_lengths_are_rejected_before_building() {
        let provider = DatasetProvider::with_frame(make_frame(200));

        let wide_label = RunConfig {
            seq_len: 4,
            label_len: 8,
            ..config()
        };
        assert!(matches!(
            provider.get(&wide_label, Split::Test, true),
            Err(EnsembleError::Configuration(_))
        ));

        let empty_window = RunConfig {
            task_name: TaskKind::AnomalyDetection,
            seq_len: 0,
            label_len: 0,
            ..config()
        };
        assert!(matches!(
            provider.get(&empty_window, Split::Test, true),
            Err(EnsembleError::Configuration(_))
        ));
        assert!(provider.is_empty());
    }

    #[test]
    fn file_source_is_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "date,load,OT").unwrap();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for i in 0..120 {
            let t = base + Duration::hours(i);
            writeln!(file, "{},{},{}", t.format("%Y-%m-%d %H:%M:%S"), i % 5, i).unwrap();
        }
        drop(file);

        let cfg = RunConfig {
            data: DatasetKind::File,
            root_path: dir.path().to_path_buf(),
            data_path: "series.csv".to_string(),
            ..config()
        };
        let provider = DatasetProvider::new();
        let (train, _) = provider.get(&cfg, Split::Train, true).unwrap();

        // Removing the file does not matter once the frame is memoized
        std::fs::remove_file(&path).unwrap();
        let (test, _) = provider.get(&cfg, Split::Test, true).unwrap();
        assert_eq!(train.n_features(), 2);
        assert_eq!(test.len(), 24);
    }

    #[test]
    fn missing_file_is_surfaced() {
        let cfg = RunConfig {
            data: DatasetKind::File,
            root_path: "/nonexistent".into(),
            ..config()
        };
        let provider = DatasetProvider::new();
        assert!(matches!(
            provider.get(&cfg, Split::Train, true),
            Err(EnsembleError::Io(_))
        ));
    }

    #[test]
    fn concurrent_requests_build_once() {
        let provider = Arc::new(DatasetProvider::with_frame(make_frame(300)));
        let cfg = config();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let cfg = cfg.clone();
                std::thread::spawn(move || provider.get(&cfg, Split::Test, true).unwrap().0)
            })
            .collect();
        let datasets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(datasets.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(provider.len(), 1);
    }
}
