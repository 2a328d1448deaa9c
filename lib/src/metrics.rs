//! Classification metrics for held-out evaluation.

use crate::features::Diagnosis;
use serde::{Deserialize, Serialize};

/// Fraction of predictions equal to the truth. Returns `0.0` for empty input.
pub fn accuracy(truth: &[Diagnosis], predicted: &[Diagnosis]) -> f64 {
    let n = truth.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / n as f64
}

/// Binary confusion matrix with malignant as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[Diagnosis], predicted: &[Diagnosis]) -> Self {
        let mut m = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (Diagnosis::Malignant, Diagnosis::Malignant) => m.true_positive += 1,
                (Diagnosis::Benign, Diagnosis::Benign) => m.true_negative += 1,
                (Diagnosis::Benign, Diagnosis::Malignant) => m.false_positive += 1,
                (Diagnosis::Malignant, Diagnosis::Benign) => m.false_negative += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// Sensitivity to malignant cases.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Diagnosis::{Benign as B, Malignant as M};

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[B, M, M, B], &[B, M, B, B]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix() {
        let truth = [M, M, M, B, B];
        let pred = [M, M, B, M, B];
        let m = ConfusionMatrix::from_predictions(&truth, &pred);

        assert_eq!(m.true_positive, 2);
        assert_eq!(m.false_negative, 1);
        assert_eq!(m.false_positive, 1);
        assert_eq!(m.true_negative, 1);
        assert_eq!(m.total(), 5);
        assert!((m.accuracy() - 0.6).abs() < 1e-12);
        assert!((m.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_matrix_ratios_are_zero() {
        let m = ConfusionMatrix::default();
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.recall(), 0.0);
    }
}
