use thiserror::Error;

/// Failures while fitting, applying or restoring a standardizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessingError {
    /// Non-finite input or output.
    #[error("Numerical error: {0}")]
    NumericalError(String),
    /// Hyperparameter or stored statistic out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Empty data: {0}")]
    EmptyData(String),
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}
