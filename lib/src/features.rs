//! Fixed-order feature vectors for fine-needle-aspirate cytology.
//!
//! Each sample is described by 30 measurements of the cell nuclei found in a
//! digitized image: ten base measurements (radius, texture, perimeter, area,
//! smoothness, compactness, concavity, concave points, symmetry, fractal
//! dimension), each summarised three ways: the mean, the standard error and
//! the "worst" (mean of the three largest values).
//!
//! The order is part of the artifact contract: a [`FeatureVector`] must be laid
//! out exactly as the rows the scaler and classifier were fitted on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of measurements in every sample.
pub const N_FEATURES: usize = 30;

/// Column names in canonical order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "mean_radius",
    "mean_texture",
    "mean_perimeter",
    "mean_area",
    "mean_smoothness",
    "mean_compactness",
    "mean_concavity",
    "mean_concave_points",
    "mean_symmetry",
    "mean_fractal_dimension",
    "se_radius",
    "se_texture",
    "se_perimeter",
    "se_area",
    "se_smoothness",
    "se_compactness",
    "se_concavity",
    "se_concave_points",
    "se_symmetry",
    "se_fractal_dimension",
    "worst_radius",
    "worst_texture",
    "worst_perimeter",
    "worst_area",
    "worst_smoothness",
    "worst_compactness",
    "worst_concavity",
    "worst_concave_points",
    "worst_symmetry",
    "worst_fractal_dimension",
];

/// Rejection reasons for a raw input row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("expected {expected} features, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("feature `{name}` (index {index}) is not a finite number")]
    NonFinite { index: usize, name: &'static str },
}

/// A validated sample: exactly [`N_FEATURES`] finite values in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    /// Validate an array of measurements.
    pub fn new(values: [f64; N_FEATURES]) -> Result<Self, FeatureError> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NonFinite {
                index,
                name: FEATURE_NAMES[index],
            });
        }
        Ok(Self(values))
    }

    /// Validate a slice of arbitrary length.
    pub fn from_slice(values: &[f64]) -> Result<Self, FeatureError> {
        let array: [f64; N_FEATURES] = values.try_into().map_err(|_| FeatureError::WrongLength {
            expected: N_FEATURES,
            actual: values.len(),
        })?;
        Self::new(array)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn as_array(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    /// Look up a measurement by its column name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.0[i])
    }

    /// Iterate `(name, value)` pairs in canonical order.
    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl TryFrom<&[f64]> for FeatureVector {
    type Error = FeatureError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        Self::from_slice(values)
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = FeatureError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

/// Binary diagnosis. Label 0 is benign, label 1 is malignant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Diagnosis {
    Benign,
    Malignant,
}

impl Diagnosis {
    pub fn label(self) -> u8 {
        match self {
            Diagnosis::Benign => 0,
            Diagnosis::Malignant => 1,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Diagnosis::Benign),
            1 => Some(Diagnosis::Malignant),
            _ => None,
        }
    }

    /// `+1` for malignant, `-1` for benign, as used by the SVM dual.
    pub(crate) fn sign(self) -> f64 {
        match self {
            Diagnosis::Benign => -1.0,
            Diagnosis::Malignant => 1.0,
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::Benign => write!(f, "benign"),
            Diagnosis::Malignant => write!(f, "malignant"),
        }
    }
}

/// Outcome of a single classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub diagnosis: Diagnosis,
    /// Probability mass on the winning label, always in `[0.5, 1.0]`.
    pub confidence: f64,
    /// Calibrated probability of the malignant class.
    pub probability_malignant: f64,
}

impl Prediction {
    pub fn label(&self) -> u8 {
        self.diagnosis.label()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// First row of the reference corpus, a confirmed malignant mass.
    pub(crate) const MALIGNANT_SAMPLE: [f64; N_FEATURES] = [
        17.99, 10.38, 122.8, 1001.0, 0.1184, 0.2776, 0.3001, 0.1471, 0.2419, 0.07871, 1.095,
        0.9053, 8.589, 153.4, 0.006399, 0.04904, 0.05373, 0.01587, 0.03003, 0.006193, 25.38,
        17.33, 184.6, 2019.0, 0.1622, 0.6656, 0.7119, 0.2654, 0.4601, 0.1189,
    ];

    #[test]
    fn test_feature_names_are_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), N_FEATURES);
    }

    #[test]
    fn test_from_slice_wrong_length() {
        for len in [0usize, 1, 29, 31, 1000] {
            let values = vec![1.0; len];
            let err = FeatureVector::from_slice(&values).unwrap_err();
            assert_eq!(
                err,
                FeatureError::WrongLength {
                    expected: 30,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn test_wrong_length_message_names_counts() {
        let err = FeatureVector::from_slice(&[0.0; 29]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("30"), "{}", msg);
        assert!(msg.contains("29"), "{}", msg);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut values = MALIGNANT_SAMPLE;
        values[3] = f64::NAN;
        assert_eq!(
            FeatureVector::new(values).unwrap_err(),
            FeatureError::NonFinite {
                index: 3,
                name: "mean_area"
            }
        );

        values[3] = 1.0;
        values[29] = f64::INFINITY;
        assert!(matches!(
            FeatureVector::new(values),
            Err(FeatureError::NonFinite { index: 29, .. })
        ));
    }

    #[test]
    fn test_named_access() {
        let fv = FeatureVector::new(MALIGNANT_SAMPLE).unwrap();
        assert_eq!(fv.get("mean_radius"), Some(17.99));
        assert_eq!(fv.get("worst_area"), Some(2019.0));
        assert_eq!(fv.get("not_a_feature"), None);

        let (name, value) = fv.iter_named().nth(10).unwrap();
        assert_eq!(name, "se_radius");
        assert_eq!(value, 1.095);
    }

    #[test]
    fn test_diagnosis_labels() {
        assert_eq!(Diagnosis::Benign.label(), 0);
        assert_eq!(Diagnosis::Malignant.label(), 1);
        assert_eq!(Diagnosis::from_label(1), Some(Diagnosis::Malignant));
        assert_eq!(Diagnosis::from_label(2), None);
        assert_eq!(Diagnosis::Malignant.to_string(), "malignant");
    }
}
