//! Labeled reference data for fitting the classifier.
//!
//! This module provides a [`LabeledDataset`] container for `(X, y)` pairs and a
//! [`DatasetProvider`] trait for the sources the fitting stage can draw from.
//!
//! # Core Concepts
//!
//! - **Dataset**: A feature matrix `X` of shape `(n_samples, 30)` plus one
//!   [`Diagnosis`] per row.
//! - **Provider**: Anything that can produce the reference dataset on demand.
//!   The fitting stage calls it at most once per fitting run.
//! - **Split**: A stratified train/evaluation partition with a fixed seed (see
//!   [`LabeledDataset::stratified_split`]).
//!
//! # Example
//!
//! ```rust
//! use cytoscan::dataset::{DatasetProvider, EmbeddedCorpus};
//!
//! let dataset = EmbeddedCorpus.load().unwrap();
//! assert_eq!(dataset.len(), 569);
//!
//! let (train, test) = dataset.stratified_split(0.2, 42).unwrap();
//! assert_eq!(train.len() + test.len(), 569);
//! ```

use crate::features::{Diagnosis, FeatureVector, N_FEATURES};
use ndarray::{Array2, ArrayView1, Axis};
use std::sync::Arc;
use thiserror::Error;

pub mod corpus;
pub mod split;

pub use self::corpus::{CorpusSource, CsvCorpus, EmbeddedCorpus};

/// Errors raised while loading or partitioning a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected header at column {column}: expected `{expected}`, found `{found}`")]
    Header {
        column: usize,
        expected: &'static str,
        found: String,
    },

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("dataset is empty")]
    Empty,

    #[error("features and labels differ in length: {rows} rows vs {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("expected {expected} feature columns, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("non-finite value at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    #[error("invalid test size {0}: must lie strictly between 0 and 1")]
    InvalidTestSize(f64),

    #[error("class {class} has {count} samples; a stratified split needs at least 2")]
    ClassTooSmall { class: Diagnosis, count: usize },
}

/// Source of the labeled reference corpus.
///
/// Implementations must be deterministic: two calls return the same rows in the
/// same order, otherwise fitted artifacts are not reproducible.
pub trait DatasetProvider: Send + Sync {
    fn load(&self) -> Result<LabeledDataset, DatasetError>;
}

impl<T: DatasetProvider + ?Sized> DatasetProvider for Arc<T> {
    fn load(&self) -> Result<LabeledDataset, DatasetError> {
        (**self).load()
    }
}

impl<T: DatasetProvider + ?Sized> DatasetProvider for Box<T> {
    fn load(&self) -> Result<LabeledDataset, DatasetError> {
        (**self).load()
    }
}

/// Feature matrix with one binary label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    features: Array2<f64>,
    labels: Vec<Diagnosis>,
}

impl LabeledDataset {
    /// Validate and wrap a feature matrix and its labels.
    ///
    /// Rejects empty data, a column count other than [`N_FEATURES`], mismatched
    /// lengths and non-finite entries.
    pub fn new(features: Array2<f64>, labels: Vec<Diagnosis>) -> Result<Self, DatasetError> {
        let (rows, cols) = features.dim();
        if rows != labels.len() {
            return Err(DatasetError::LengthMismatch {
                rows,
                labels: labels.len(),
            });
        }
        if rows == 0 {
            return Err(DatasetError::Empty);
        }
        if cols != N_FEATURES {
            return Err(DatasetError::FeatureCount {
                expected: N_FEATURES,
                actual: cols,
            });
        }
        if let Some(((row, column), _)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(DatasetError::NonFinite { row, column });
        }
        Ok(Self { features, labels })
    }

    /// Build a dataset from already-validated feature vectors.
    pub fn from_samples(
        samples: &[FeatureVector],
        labels: Vec<Diagnosis>,
    ) -> Result<Self, DatasetError> {
        let flat: Vec<f64> = samples
            .iter()
            .flat_map(|s| s.as_slice().iter().copied())
            .collect();
        let features = Array2::from_shape_vec((samples.len(), N_FEATURES), flat)
            .map_err(|e| DatasetError::InvalidRow {
                row: 0,
                message: e.to_string(),
            })?;
        Self::new(features, labels)
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[Diagnosis] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.features.row(index)
    }

    /// Row `index` as a [`FeatureVector`], or `None` if out of range.
    pub fn sample(&self, index: usize) -> Option<FeatureVector> {
        if index >= self.len() {
            return None;
        }
        FeatureVector::from_slice(&self.features.row(index).to_vec()).ok()
    }

    /// `(benign, malignant)` counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let malignant = self
            .labels
            .iter()
            .filter(|&&d| d == Diagnosis::Malignant)
            .count();
        (self.labels.len() - malignant, malignant)
    }

    /// Subset of rows in the given order. Indices must be in range.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Consume the dataset, returning the raw parts.
    pub fn into_parts(self) -> (Array2<f64>, Vec<Diagnosis>) {
        (self.features, self.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tiny(rows: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, N_FEATURES), |(r, c)| (r * N_FEATURES + c) as f64)
    }

    #[test]
    fn test_new_validates_lengths() {
        let result = LabeledDataset::new(tiny(3), vec![Diagnosis::Benign; 2]);
        assert!(matches!(
            result,
            Err(DatasetError::LengthMismatch { rows: 3, labels: 2 })
        ));
    }

    #[test]
    fn test_new_rejects_empty() {
        let result = LabeledDataset::new(Array2::zeros((0, N_FEATURES)), vec![]);
        assert!(matches!(result, Err(DatasetError::Empty)));
    }

    #[test]
    fn test_new_rejects_wrong_width() {
        let result = LabeledDataset::new(array![[1.0, 2.0]], vec![Diagnosis::Benign]);
        assert!(matches!(
            result,
            Err(DatasetError::FeatureCount {
                expected: 30,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let mut x = tiny(2);
        x[[1, 4]] = f64::NAN;
        let result = LabeledDataset::new(x, vec![Diagnosis::Benign, Diagnosis::Malignant]);
        assert!(matches!(
            result,
            Err(DatasetError::NonFinite { row: 1, column: 4 })
        ));
    }

    #[test]
    fn test_select_and_counts() {
        let labels = vec![
            Diagnosis::Benign,
            Diagnosis::Malignant,
            Diagnosis::Benign,
            Diagnosis::Malignant,
        ];
        let ds = LabeledDataset::new(tiny(4), labels).unwrap();
        assert_eq!(ds.class_counts(), (2, 2));

        let subset = ds.select(&[3, 0]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.labels(), &[Diagnosis::Malignant, Diagnosis::Benign]);
        assert_eq!(subset.row(0)[0], (3 * N_FEATURES) as f64);
        assert_eq!(subset.row(1)[0], 0.0);
    }

    #[test]
    fn test_sample_roundtrip() {
        let ds = LabeledDataset::new(tiny(2), vec![Diagnosis::Benign; 2]).unwrap();
        let fv = ds.sample(1).unwrap();
        assert_eq!(fv.as_slice()[0], N_FEATURES as f64);
        assert!(ds.sample(2).is_none());
    }
}
