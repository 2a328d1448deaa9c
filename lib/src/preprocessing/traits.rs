//! Fit/transform traits shared by the preprocessing stages.
//!
//! A [`Transformer`] holds configuration only. Fitting it yields a
//! [`FittedTransformer`], which owns the learned statistics, transforms rows
//! and round-trips through its params type for the artifact store.

use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;

/// Unfitted stage: configuration that learns from a training matrix.
///
/// ```
/// use cytoscan::preprocessing::{FittedTransformer, StandardScaler, Transformer};
/// use ndarray::array;
///
/// let data = array![[1.0, 10.0], [3.0, 30.0]];
/// let fitted = StandardScaler::new().fit(&data).unwrap();
/// let scaled = fitted.transform(&data).unwrap();
/// assert_eq!(scaled[[0, 0]], -1.0);
/// ```
pub trait Transformer: Clone {
    type Input;
    type Output;
    type Params: SerializableParams;
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Learn statistics from `data`.
    ///
    /// # Errors
    /// [`PreprocessingError::EmptyData`] for a matrix without rows or columns,
    /// [`PreprocessingError::NumericalError`] when `data` holds NaN or infinity.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError>;

    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.fit(data)?.transform(data)
    }
}

/// Fitted stage. Never mutated after fitting; refitting builds a new value.
///
/// `from_params(extract_params())` reproduces the same transform.
pub trait FittedTransformer: Clone {
    type Input;
    type Output;
    type Params: SerializableParams;

    /// # Errors
    /// [`PreprocessingError::FeatureMismatch`] when the column count differs
    /// from the one seen during fit.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError>;

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError>;

    fn extract_params(&self) -> Self::Params;

    /// Rebuild from stored params. The params are validated, not trusted.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    fn n_features_in(&self) -> usize;
}
