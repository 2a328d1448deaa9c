//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training samples, and `s` is the population
//! standard deviation (ddof = 0).
//!
//! A feature that is constant over the training data has `s = 0`. Its scale is
//! stored as `1.0`, so such a feature transforms to `x - u`.

use crate::features::{FeatureVector, N_FEATURES};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerConfig {
    /// If true, center the data before scaling.
    pub with_mean: bool,
    /// If true, scale the data to unit variance.
    pub with_std: bool,
}

impl Default for StandardScalerConfig {
    fn default() -> Self {
        Self {
            with_mean: true,
            with_std: true,
        }
    }
}

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Configuration options.
    pub config: StandardScalerConfig,
    /// Mean of each feature (zeros if `with_mean` is false).
    pub mean: Vec<f64>,
    /// Divisor for each feature; zero-variance features are stored as 1.0.
    pub scale: Vec<f64>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    config: StandardScalerConfig,
}

impl StandardScaler {
    /// Create a new StandardScaler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to center data by mean.
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.config.with_mean = with_mean;
        self
    }

    /// Set whether to scale data to unit variance.
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.config.with_std = with_std;
        self
    }
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        let (rows, cols) = data.dim();

        if rows == 0 {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(PreprocessingError::NumericalError(
                "Cannot fit StandardScaler on non-finite data".to_string(),
            ));
        }

        let mean = if self.config.with_mean {
            data.mean_axis(Axis(0))
                .ok_or_else(|| PreprocessingError::EmptyData("no rows".to_string()))?
        } else {
            Array1::zeros(cols)
        };

        let scale = if self.config.with_std {
            data.std_axis(Axis(0), 0.0)
                .mapv(|s| if s == 0.0 { 1.0 } else { s })
        } else {
            Array1::ones(cols)
        };

        Ok(FittedStandardScaler {
            config: self.config.clone(),
            mean,
            scale,
        })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler {
    config: StandardScalerConfig,
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Get the divisor for each feature.
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Standardize a single validated sample.
    pub fn transform_row(&self, sample: &FeatureVector) -> Result<Array1<f64>, PreprocessingError> {
        if self.n_features_in() != N_FEATURES {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features_in(),
                got_features: N_FEATURES,
            });
        }
        let row = Array1::from_iter(sample.as_slice().iter().copied());
        let out = (row - &self.mean) / &self.scale;
        check_finite(out.iter())?;
        Ok(out)
    }

    fn check_width(&self, cols: usize) -> Result<(), PreprocessingError> {
        if cols != self.n_features_in() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: self.n_features_in(),
                got_features: cols,
            });
        }
        Ok(())
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        self.check_width(data.ncols())?;
        let out = (data - &self.mean) / &self.scale;
        check_finite(out.iter())?;
        Ok(out)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input, PreprocessingError> {
        self.check_width(data.ncols())?;
        Ok(data * &self.scale + &self.mean)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            config: self.config.clone(),
            mean: self.mean.to_vec(),
            scale: self.scale.to_vec(),
            n_features: self.mean.len(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.mean.len() != params.n_features || params.scale.len() != params.n_features {
            return Err(PreprocessingError::InvalidParameter(format!(
                "expected {} means and scales, got {} and {}",
                params.n_features,
                params.mean.len(),
                params.scale.len()
            )));
        }
        if params.mean.iter().any(|m| !m.is_finite()) {
            return Err(PreprocessingError::InvalidParameter(
                "mean contains non-finite values".to_string(),
            ));
        }
        if params.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(PreprocessingError::InvalidParameter(
                "scale must be finite and positive".to_string(),
            ));
        }

        Ok(Self {
            config: params.config,
            mean: Array1::from(params.mean),
            scale: Array1::from(params.scale),
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}

fn check_finite<'a>(mut values: impl Iterator<Item = &'a f64>) -> Result<(), PreprocessingError> {
    if values.any(|v| !v.is_finite()) {
        return Err(PreprocessingError::NumericalError(
            "standardized value is not finite".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::MALIGNANT_SAMPLE;
    use ndarray::array;

    fn create_test_data() -> Array2<f64> {
        array![[0.0, 1.0], [0.0, 1.0], [1.0, 3.0]]
    }

    fn wide_data() -> Array2<f64> {
        Array2::from_shape_fn((4, N_FEATURES), |(r, c)| (r as f64 + 1.0) * (c as f64 + 1.0))
    }

    #[test]
    fn test_standard_scaler_fit() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();

        // Mean: [1/3, 5/3]
        let mean = fitted.mean();
        assert!((mean[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((mean[1] - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_transform() {
        let data = create_test_data();
        let transformed = StandardScaler::new().fit_transform(&data).unwrap();

        // After standardization, each column should have mean≈0 and std≈1
        let means = transformed.mean_axis(Axis(0)).unwrap();
        let stds = transformed.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert!(means[j].abs() < 1e-12, "mean[{}] = {}", j, means[j]);
            assert!((stds[j] - 1.0).abs() < 1e-12, "std[{}] = {}", j, stds[j]);
        }
    }

    #[test]
    fn test_standard_scaler_inverse_transform() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();

        let recovered = fitted
            .inverse_transform(&fitted.transform(&data).unwrap())
            .unwrap();
        for (o, r) in data.iter().zip(recovered.iter()) {
            assert!((o - r).abs() < 1e-12);
        }
    }

    #[test]
    fn test_standard_scaler_without_mean() {
        let fitted = StandardScaler::new()
            .with_mean(false)
            .fit(&create_test_data())
            .unwrap();
        assert!(fitted.mean().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_standard_scaler_without_std() {
        let fitted = StandardScaler::new()
            .with_std(false)
            .fit(&create_test_data())
            .unwrap();
        assert!(fitted.scale().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_standard_scaler_constant_feature_is_only_centered() {
        // Column 0 is constant.
        let data = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        assert_eq!(fitted.scale()[0], 1.0);
        assert_eq!(fitted.mean()[0], 5.0);

        let out = fitted.transform(&array![[7.5, 2.0]]).unwrap();
        assert_eq!(out[[0, 0]], 2.5);
        assert!(out[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_feature_mismatch() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let result = fitted.transform(&array![[1.0, 2.0, 3.0]]);

        assert_eq!(
            result,
            Err(PreprocessingError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        );
        assert!(matches!(
            fitted.inverse_transform(&array![[1.0, 2.0, 3.0]]),
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_transform_row_requires_full_width() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let sample = FeatureVector::new(MALIGNANT_SAMPLE).unwrap();
        assert!(matches!(
            fitted.transform_row(&sample),
            Err(PreprocessingError::FeatureMismatch {
                expected_features: 2,
                got_features: 30
            })
        ));
    }

    #[test]
    fn test_transform_row_matches_batch() {
        let data = wide_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let sample = FeatureVector::new(MALIGNANT_SAMPLE).unwrap();

        let single = fitted.transform_row(&sample).unwrap();
        let batch = fitted
            .transform(&Array2::from_shape_vec((1, N_FEATURES), MALIGNANT_SAMPLE.to_vec()).unwrap())
            .unwrap();
        for (a, b) in single.iter().zip(batch.row(0).iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_standard_scaler_params_roundtrip() {
        let data = wide_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let params = fitted.extract_params();
        assert_eq!(params.n_features, N_FEATURES);

        let restored = FittedStandardScaler::from_params(params).unwrap();
        assert_eq!(restored, fitted);
    }

    #[test]
    fn test_from_params_rejects_bad_values() {
        let good = StandardScaler::new().fit(&create_test_data()).unwrap().extract_params();

        let mut short = good.clone();
        short.scale.pop();
        assert!(FittedStandardScaler::from_params(short).is_err());

        let mut zero = good.clone();
        zero.scale[1] = 0.0;
        assert!(FittedStandardScaler::from_params(zero).is_err());

        let mut nan = good;
        nan.mean[0] = f64::NAN;
        assert!(FittedStandardScaler::from_params(nan).is_err());
    }

    #[test]
    fn test_standard_scaler_empty_data() {
        let result = StandardScaler::new().fit(&Array2::zeros((0, 2)));
        assert!(matches!(result, Err(PreprocessingError::EmptyData(_))));
    }

    #[test]
    fn test_standard_scaler_non_finite_data() {
        let result = StandardScaler::new().fit(&array![[1.0, f64::INFINITY]]);
        assert!(matches!(result, Err(PreprocessingError::NumericalError(_))));
    }
}
