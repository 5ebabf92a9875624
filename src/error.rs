//! Error types for the tabe-ensemble library.

use thiserror::Error;

/// Result type alias for ensemble operations.
pub type Result<T> = std::result::Result<T, EnsembleError>;

/// Errors that can occur while building datasets or running the ensemble.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnsembleError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unknown identifier or inconsistent run configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A one-step operation received a batch holding more (or fewer) than one window.
    #[error("step batch must hold exactly one window, got {got}")]
    StepBatchSize { got: usize },

    /// Collected predictions do not line up with the truths of a split.
    #[error("length mismatch: {predictions} predictions for {truths} truths")]
    LengthMismatch { predictions: usize, truths: usize },

    /// Filesystem error while reading a data source or config file.
    #[error("io error: {0}")]
    Io(String),

    /// Malformed record in a data source or config file.
    #[error("parse error: {0}")]
    Parse(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl From<std::io::Error> for EnsembleError {
    fn from(err: std::io::Error) -> Self {
        EnsembleError::Io(err.to_string())
    }
}

impl From<csv::Error> for EnsembleError {
    fn from(err: csv::Error) -> Self {
        EnsembleError::Parse(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for EnsembleError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        EnsembleError::Configuration(err.to_string())
    }
}

impl From<ndarray::ShapeError> for EnsembleError {
    fn from(err: ndarray::ShapeError) -> Self {
        EnsembleError::ComputationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = EnsembleError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = EnsembleError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = EnsembleError::StepBatchSize { got: 4 };
        assert_eq!(
            err.to_string(),
            "step batch must hold exactly one window, got 4"
        );

        let err = EnsembleError::LengthMismatch {
            predictions: 89,
            truths: 90,
        };
        assert_eq!(
            err.to_string(),
            "length mismatch: 89 predictions for 90 truths"
        );

        let err = EnsembleError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 2");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: EnsembleError = io.into();
        assert!(matches!(err, EnsembleError::Io(ref msg) if msg.contains("missing.csv")));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = EnsembleError::Configuration("unknown task".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
