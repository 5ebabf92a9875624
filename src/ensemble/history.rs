//! Per-step prediction history.

use crate::error::{EnsembleError, Result};

/// Everything produced for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub truth: f64,
    pub ensemble: f64,
    pub adjusted: f64,
    pub combiner: f64,
    /// One prediction per base model.
    pub base: Vec<f64>,
}

/// Parallel series of truths and predictions, always of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionHistory {
    truths: Vec<f64>,
    ensemble: Vec<f64>,
    adjusted: Vec<f64>,
    combiner: Vec<f64>,
    base: Vec<Vec<f64>>,
}

impl PredictionHistory {
    /// Empty history tracking `n_base` base models.
    pub fn new(n_base: usize) -> Self {
        Self {
            base: vec![Vec::new(); n_base],
            ..Self::default()
        }
    }

    /// History built from complete series; every series must have the same length.
    pub fn from_series(
        truths: Vec<f64>,
        ensemble: Vec<f64>,
        adjusted: Vec<f64>,
        combiner: Vec<f64>,
        base: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let n = truths.len();
        for len in [ensemble.len(), adjusted.len(), combiner.len()]
            .into_iter()
            .chain(base.iter().map(Vec::len))
        {
            if len != n {
                return Err(EnsembleError::LengthMismatch {
                    predictions: len,
                    truths: n,
                });
            }
        }
        Ok(Self {
            truths,
            ensemble,
            adjusted,
            combiner,
            base,
        })
    }

    /// Append one step to every series.
    pub fn push(&mut self, record: StepRecord) -> Result<()> {
        if record.base.len() != self.base.len() {
            return Err(EnsembleError::DimensionMismatch {
                expected: self.base.len(),
                got: record.base.len(),
            });
        }
        self.truths.push(record.truth);
        self.ensemble.push(record.ensemble);
        self.adjusted.push(record.adjusted);
        self.combiner.push(record.combiner);
        for (series, p) in self.base.iter_mut().zip(record.base) {
            series.push(p);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.truths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.truths.is_empty()
    }

    pub fn n_base(&self) -> usize {
        self.base.len()
    }

    pub fn truths(&self) -> &[f64] {
        &self.truths
    }

    pub fn ensemble(&self) -> &[f64] {
        &self.ensemble
    }

    pub fn adjusted(&self) -> &[f64] {
        &self.adjusted
    }

    pub fn combiner(&self) -> &[f64] {
        &self.combiner
    }

    /// Series of base model `i`.
    pub fn base(&self, i: usize) -> Result<&[f64]> {
        self.base
            .get(i)
            .map(Vec::as_slice)
            .ok_or(EnsembleError::IndexOutOfBounds {
                index: i,
                size: self.base.len(),
            })
    }

    /// Record for step `t`.
    pub fn step(&self, t: usize) -> Option<StepRecord> {
        if t >= self.len() {
            return None;
        }
        Some(StepRecord {
            truth: self.truths[t],
            ensemble: self.ensemble[t],
            adjusted: self.adjusted[t],
            combiner: self.combiner[t],
            base: self.base.iter().map(|s| s[t]).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t: f64, n_base: usize) -> StepRecord {
        StepRecord {
            truth: t,
            ensemble: t + 0.1,
            adjusted: t + 0.1,
            combiner: t + 0.2,
            base: vec![t; n_base],
        }
    }

    #[test]
    fn push_keeps_series_in_lockstep() {
        let mut h = PredictionHistory::new(2);
        for t in 0..5 {
            h.push(record(t as f64, 2)).unwrap();
        }
        assert_eq!(h.len(), 5);
        assert_eq!(h.ensemble().len(), 5);
        assert_eq!(h.combiner().len(), 5);
        assert_eq!(h.base(1).unwrap().len(), 5);
        assert_eq!(h.step(3), Some(record(3.0, 2)));
        assert_eq!(h.step(5), None);
    }

    #[test]
    fn push_rejects_wrong_base_width() {
        let mut h = PredictionHistory::new(2);
        assert!(matches!(
            h.push(record(0.0, 3)),
            Err(EnsembleError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
        assert!(h.is_empty());
    }

    #[test]
    fn from_series_checks_lengths() {
        let ok = PredictionHistory::from_series(
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            vec![vec![0.0, 0.0]],
        )
        .unwrap();
        assert_eq!(ok.n_base(), 1);

        let bad = PredictionHistory::from_series(
            vec![1.0, 2.0],
            vec![1.0],
            vec![1.0, 2.0],
            vec![1.0, 2.0],
            Vec::new(),
        );
        assert!(matches!(
            bad,
            Err(EnsembleError::LengthMismatch {
                predictions: 1,
                truths: 2
            })
        ));
    }

    #[test]
    fn base_index_is_checked() {
        let h = PredictionHistory::new(1);
        assert!(h.base(0).is_ok());
        assert!(h.base(1).is_err());
    }
}
