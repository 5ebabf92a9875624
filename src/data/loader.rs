//! Batching loader over a dataset.

use crate::config::RunConfig;
use crate::core::{Batch, Window};
use crate::data::dataset::{Dataset, SplitDataset};
use crate::data::split::Split;
use crate::error::{EnsembleError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How a loader batches and orders windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub batch_size: usize,
    pub shuffle: bool,
    pub drop_last: bool,
    /// Carried from the config; batches are assembled on the consuming thread.
    pub num_workers: usize,
    /// Pad/truncate inputs to this many rows (classification).
    pub pad_len: Option<usize>,
    pub seed: u64,
}

impl LoaderOptions {
    /// Options for a split.
    ///
    /// Stepwise loaders always yield one window at a time in chronological
    /// order, whatever batch size the config asks for. Held-out splits are
    /// never shuffled either.
    pub fn for_split(
        config: &RunConfig,
        split: Split,
        stepwise: bool,
        pad_len: Option<usize>,
    ) -> Self {
        Self {
            batch_size: if stepwise { 1 } else { config.batch_size },
            shuffle: !(stepwise || split.is_held_out()),
            drop_last: false,
            num_workers: config.num_workers,
            pad_len,
            seed: config.seed,
        }
    }

    /// Chronological, one window per batch.
    pub fn stepwise() -> Self {
        Self {
            batch_size: 1,
            shuffle: false,
            drop_last: false,
            num_workers: 0,
            pad_len: None,
            seed: 0,
        }
    }
}

/// Produces lazy, finite passes of batches over one dataset.
#[derive(Debug)]
pub struct DataLoader {
    dataset: Arc<SplitDataset>,
    options: LoaderOptions,
    passes: AtomicU64,
}

impl DataLoader {
    pub fn new(dataset: Arc<SplitDataset>, options: LoaderOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(EnsembleError::InvalidParameter(
                "batch_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            options,
            passes: AtomicU64::new(0),
        })
    }

    pub fn dataset(&self) -> &Arc<SplitDataset> {
        &self.dataset
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn is_stepwise(&self) -> bool {
        self.options.batch_size == 1 && !self.options.shuffle
    }

    /// Batches per pass.
    pub fn len(&self) -> usize {
        let n = self.dataset.len();
        let b = self.options.batch_size;
        if self.options.drop_last {
            n / b
        } else {
            n.div_ceil(b)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a new pass.
    ///
    /// Shuffled loaders draw a fresh permutation per pass from the configured
    /// seed, so a run is reproducible end to end.
    pub fn iter(&self) -> Batches<'_> {
        let pass = self.passes.fetch_add(1, Ordering::Relaxed);
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.options.shuffle {
            let mut rng = StdRng::seed_from_u64(self.options.seed.wrapping_add(pass));
            order.shuffle(&mut rng);
        }
        let remaining = self.len();
        Batches {
            loader: self,
            order,
            cursor: 0,
            remaining,
        }
    }
}

impl<'a> IntoIterator for &'a DataLoader {
    type Item = Result<Batch>;
    type IntoIter = Batches<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a loader.
#[derive(Debug)]
pub struct Batches<'a> {
    loader: &'a DataLoader,
    order: Vec<usize>,
    cursor: usize,
    remaining: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let end = (self.cursor + self.loader.options.batch_size).min(self.order.len());
        let chunk = &self.order[self.cursor..end];
        self.cursor = end;

        let windows: Result<Vec<Window>> = chunk
            .iter()
            .map(|&i| self.loader.dataset.get(i))
            .collect();

        Some(windows.and_then(|windows| match self.loader.options.pad_len {
            Some(max_len) => Batch::collate_padded(&windows, max_len),
            None => Batch::stack(&windows),
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}
