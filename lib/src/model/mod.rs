//! Classifiers with compile-time state safety.
//!
//! Training and inference are separate types: an unfitted model holds
//! hyperparameters, a fitted one holds only what prediction needs, and only the
//! fitted one implements [`InferenceModel`].

pub mod error;
pub mod kernel;
pub mod platt;
pub(crate) mod smo;
pub mod svc;

pub use error::{FitError, ModelError};
pub use kernel::{Gamma, RbfKernel};
pub use platt::PlattSigmoid;
pub use svc::{Fitted, SupportVectorClassifier, Svc, SvcConfig, SvcParams, Unfitted};

use crate::serialization::SerializableParams;

/// Prediction and parameter round-trip for a trained model.
pub trait InferenceModel: Sized {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;
    /// Plain-data form of the learned parameters.
    type ParamsRepr: SerializableParams;

    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle, ModelError>;
    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch, ModelError>;

    fn extract_params(&self) -> Self::ParamsRepr;

    /// Rebuild a model from parameters that came from storage; they are
    /// validated, not trusted.
    fn from_params(params: Self::ParamsRepr) -> Result<Self, ModelError>;
}
