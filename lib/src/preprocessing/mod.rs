//! Feature preprocessing.
//!
//! Transformers follow the same type-state pattern as models in this crate: an
//! unfitted [`Transformer`] carries configuration only, and `fit` turns it into a
//! [`FittedTransformer`] whose learned parameters can be extracted, stored and
//! restored.
//!
//! The classifier only needs z-score standardization ([`StandardScaler`]); it is
//! fitted on the training partition alone and then applied unchanged to the
//! evaluation partition and to every inference request.

pub mod error;
pub mod scaling;
pub mod traits;

pub use error::PreprocessingError;
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
