//! Errors surfaced by [`Pipeline`](crate::pipeline::Pipeline).
//!
//! The four kinds let a caller tell bad input apart from an unavailable
//! system and from an internal failure. Values are cheap to clone so a failed
//! pipeline can hand the same error to every later caller.

use crate::artifact::{ArtifactError, InferenceError};
use crate::features::FeatureError;
use crate::fitting::FittingError;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Wrong element count or a non-finite value.
    #[error("invalid feature vector: {0}")]
    InvalidFeatureVector(#[from] FeatureError),

    /// No stored artifacts and fitting (or persisting the result) failed.
    #[error("training failed: {0}")]
    TrainingFailure(#[source] Arc<FittingError>),

    /// Stored artifacts were unreadable or invalid and refitting failed too.
    #[error("stored artifacts unusable ({cause}) and refitting failed: {refit}")]
    ArtifactUnavailable {
        cause: Arc<ArtifactError>,
        #[source]
        refit: Arc<FittingError>,
    },

    /// Standardization or classification failed on a valid vector.
    #[error("prediction failed: {0}")]
    PredictionError(#[from] InferenceError),
}

impl PipelineError {
    /// True when the caller supplied bad input; every other kind is a system fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PipelineError::InvalidFeatureVector(_))
    }
}
