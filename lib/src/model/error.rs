//! Error types for fitting and evaluating models.

use crate::features::Diagnosis;
use thiserror::Error;

/// Failures while training a classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("cannot fit on empty data")]
    EmptyData,

    #[error("features have {rows} rows but {labels} labels were given")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("training data contains non-finite values")]
    NonFiniteData,

    #[error("training data contains a single class ({0}); two are required")]
    SingleClass(Diagnosis),

    #[error("invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Failures while evaluating a fitted classifier or restoring it from parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    #[error("probability estimates were not enabled when the model was fitted")]
    ProbabilityDisabled,

    #[error("decision value is not finite")]
    NonFinite,

    #[error("invalid model parameters: {0}")]
    InvalidParams(String),
}
