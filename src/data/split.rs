//! Chronological data splits.

use crate::config::SplitRatios;
use crate::error::{EnsembleError, Result};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// A chronological partition of the raw series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Split {
    /// Fits the base models / combiner.
    Train,
    /// Fits the adjuster on the already-trained combiner's outputs.
    EnsembleTrain,
    Val,
    /// Held out; only ever read in chronological order.
    Test,
}

impl Split {
    pub const ALL: [Split; 4] = [Split::Train, Split::EnsembleTrain, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::EnsembleTrain => "ensemble_train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    /// Evaluation splits are never shuffled.
    pub fn is_held_out(&self) -> bool {
        matches!(self, Split::Test)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "ensemble_train" => Ok(Split::EnsembleTrain),
            "val" => Ok(Split::Val),
            "test" => Ok(Split::Test),
            other => Err(EnsembleError::Configuration(format!(
                "unknown split '{other}'"
            ))),
        }
    }
}

/// Rows a split owns, without look-back context.
pub fn own_rows(n_rows: usize, ratios: &SplitRatios, split: Split) -> Result<Range<usize>> {
    let count = |r: f64| (n_rows as f64 * r + 1e-9).floor() as usize;
    let train_end = count(ratios.train);
    let ens_end = train_end + count(ratios.ensemble_train);
    let val_end = ens_end + count(ratios.val);
    let test_start = n_rows - count(ratios.test).min(n_rows);

    let rows = match split {
        Split::Train => 0..train_end,
        Split::EnsembleTrain => train_end..ens_end,
        Split::Val => ens_end..val_end,
        Split::Test => test_start.max(val_end)..n_rows,
    };

    if rows.is_empty() {
        return Err(EnsembleError::InsufficientData {
            needed: 1,
            got: 0,
        });
    }
    Ok(rows)
}

/// Rows a dataset for `split` reads: its own rows plus up to `seq_len`
/// preceding rows of context, so the first window is complete.
pub fn split_borders(
    n_rows: usize,
    ratios: &SplitRatios,
    seq_len: usize,
    split: Split,
) -> Result<Range<usize>> {
    let own = own_rows(n_rows, ratios, split)?;
    let start = match split {
        Split::Train => own.start,
        _ => own.start.saturating_sub(seq_len),
    };
    Ok(start..own.end)
}
