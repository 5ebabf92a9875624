//! Window-based reference models.
//!
//! Each model reads only the observed target values of the batch's input
//! window, so none of them can see the truth of the step being predicted.

use crate::core::Batch;
use crate::error::{EnsembleError, Result};
use crate::models::BaseModel;

fn target_history(batch: &Batch) -> Result<Vec<f64>> {
    let values = batch.target_input(0)?;
    if values.is_empty() {
        return Err(EnsembleError::EmptyData);
    }
    Ok(values)
}

/// Naive forecaster that repeats the last observed value.
#[derive(Debug, Clone, Default)]
pub struct LastValue;

impl LastValue {
    pub fn new() -> Self {
        Self
    }
}

impl BaseModel for LastValue {
    fn name(&self) -> &str {
        "LastValue"
    }

    fn predict(&self, batch: &Batch) -> Result<f64> {
        let values = target_history(batch)?;
        Ok(values[values.len() - 1])
    }
}

/// Mean of the last `window` observations (the whole input when `window` is 0).
#[derive(Debug, Clone)]
pub struct WindowAverage {
    window: usize,
    name: String,
}

impl WindowAverage {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            name: format!("WindowAverage({window})"),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl BaseModel for WindowAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, batch: &Batch) -> Result<f64> {
        let values = target_history(batch)?;
        let take = if self.window == 0 {
            values.len()
        } else {
            self.window.min(values.len())
        };
        let tail = &values[values.len() - take..];
        Ok(tail.iter().sum::<f64>() / take as f64)
    }
}

/// Random walk with drift: extends the average slope of the input window.
#[derive(Debug, Clone, Default)]
pub struct Drift;

impl Drift {
    pub fn new() -> Self {
        Self
    }
}

impl BaseModel for Drift {
    fn name(&self) -> &str {
        "Drift"
    }

    fn predict(&self, batch: &Batch) -> Result<f64> {
        let values = target_history(batch)?;
        let n = values.len();
        let last = values[n - 1];
        if n < 2 {
            return Ok(last);
        }
        let slope = (last - values[0]) / (n - 1) as f64;
        Ok(last + slope)
    }
}

/// Repeats the value observed one seasonal period before the next step.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    name: String,
}

impl SeasonalNaive {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(EnsembleError::InvalidParameter(
                "seasonal period must be positive".to_string(),
            ));
        }
        Ok(Self {
            period,
            name: format!("SeasonalNaive({period})"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl BaseModel for SeasonalNaive {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, batch: &Batch) -> Result<f64> {
        let values = target_history(batch)?;
        if values.len() < self.period {
            return Err(EnsembleError::InsufficientData {
                needed: self.period,
                got: values.len(),
            });
        }
        Ok(values[values.len() - self.period])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Window;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn batch_from(target: &[f64]) -> Batch {
        let n = target.len();
        let mut x = Array2::zeros((n, 2));
        for (i, &v) in target.iter().enumerate() {
            x[[i, 0]] = -1.0;
            x[[i, 1]] = v;
        }
        let window = Window {
            index: 0,
            x,
            // Truth far away from anything the models could produce
            y: Array2::from_elem((1, 2), 1e6),
            x_mark: Array2::zeros((n, 0)),
            y_mark: Array2::zeros((1, 0)),
        };
        Batch::stack(&[window]).unwrap()
    }

    #[test]
    fn last_value_repeats_last_observation() {
        let batch = batch_from(&[1.0, 2.0, 5.0]);
        assert_eq!(LastValue::new().predict(&batch).unwrap(), 5.0);
    }

    #[test]
    fn window_average_uses_tail() {
        let batch = batch_from(&[1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(WindowAverage::new(2).predict(&batch).unwrap(), 3.5);
        assert_relative_eq!(WindowAverage::new(0).predict(&batch).unwrap(), 2.5);
        // Window longer than the input falls back to the whole input
        assert_relative_eq!(WindowAverage::new(10).predict(&batch).unwrap(), 2.5);
    }

    #[test]
    fn drift_extends_slope() {
        let batch = batch_from(&[2.0, 4.0, 6.0]);
        assert_relative_eq!(Drift::new().predict(&batch).unwrap(), 8.0);
        assert_eq!(Drift::new().predict(&batch_from(&[3.0])).unwrap(), 3.0);
    }

    #[test]
    fn seasonal_naive_looks_back_one_period() {
        let batch = batch_from(&[10.0, 20.0, 30.0, 11.0, 21.0, 31.0]);
        let model = SeasonalNaive::new(3).unwrap();
        assert_eq!(model.predict(&batch).unwrap(), 11.0);
        assert_eq!(model.name(), "SeasonalNaive(3)");
    }

    #[test]
    fn seasonal_naive_needs_a_full_period() {
        let model = SeasonalNaive::new(5).unwrap();
        assert!(matches!(
            model.predict(&batch_from(&[1.0, 2.0])),
            Err(EnsembleError::InsufficientData { needed: 5, got: 2 })
        ));
        assert!(SeasonalNaive::new(0).is_err());
    }

    #[test]
    fn predictions_ignore_truth() {
        let batch = batch_from(&[1.0, 2.0, 3.0]);
        let models: Vec<Box<dyn BaseModel>> = vec![
            Box::new(LastValue::new()),
            Box::new(WindowAverage::new(0)),
            Box::new(Drift::new()),
        ];
        for model in &models {
            assert!(model.predict(&batch).unwrap() < 10.0, "{}", model.name());
        }
    }
}
