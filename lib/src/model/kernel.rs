//! Radial-basis-function kernel.
//!
//! `K(a, b) = exp(-gamma * ||a - b||^2)`

use crate::model::error::FitError;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// How the kernel coefficient is chosen at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, the variance taken over every element of the
    /// training matrix. Falls back to `1.0` when that variance is zero.
    Scale,
    /// A fixed positive coefficient.
    Value(f64),
}

impl Default for Gamma {
    fn default() -> Self {
        Gamma::Scale
    }
}

impl Gamma {
    /// Turn the policy into a concrete coefficient for training matrix `x`.
    pub fn resolve(&self, x: &Array2<f64>) -> Result<f64, FitError> {
        match *self {
            Gamma::Scale => {
                if x.is_empty() {
                    return Err(FitError::EmptyData);
                }
                let var = x.var(0.0);
                if var == 0.0 {
                    Ok(1.0)
                } else {
                    Ok(1.0 / (x.ncols() as f64 * var))
                }
            }
            Gamma::Value(g) if g.is_finite() && g > 0.0 => Ok(g),
            Gamma::Value(g) => Err(FitError::InvalidParameter(format!(
                "gamma must be finite and positive, got {}",
                g
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn eval(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        let sq_dist: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum();
        (-self.gamma * sq_dist).exp()
    }

    /// Symmetric kernel matrix over the rows of `x`.
    pub fn gram(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            k[[i, i]] = 1.0;
            for j in (i + 1)..n {
                let v = self.eval(x.row(i), x.row(j));
                k[[i, j]] = v;
                k[[j, i]] = v;
            }
        }
        k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rbf_identity_is_one() {
        let k = RbfKernel::new(0.5);
        let a = array![1.0, -2.0, 3.0];
        assert_eq!(k.eval(a.view(), a.view()), 1.0);
    }

    #[test]
    fn test_rbf_known_value() {
        let k = RbfKernel::new(0.5);
        let a = array![0.0, 0.0];
        let b = array![1.0, 1.0];
        // exp(-0.5 * 2)
        assert!((k.eval(a.view(), b.view()) - (-1.0f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_gram_is_symmetric_with_unit_diagonal() {
        let x = array![[0.0, 1.0], [2.0, 0.5], [-1.0, 3.0]];
        let g = RbfKernel::new(0.3).gram(&x);
        for i in 0..3 {
            assert_eq!(g[[i, i]], 1.0);
            for j in 0..3 {
                assert_eq!(g[[i, j]], g[[j, i]]);
                assert!(g[[i, j]] > 0.0 && g[[i, j]] <= 1.0);
            }
        }
    }

    #[test]
    fn test_gamma_scale() {
        // Elements 0, 2, 4, 6 -> variance 5, two columns -> 1 / 10
        let x = array![[0.0, 2.0], [4.0, 6.0]];
        assert!((Gamma::Scale.resolve(&x).unwrap() - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_gamma_scale_zero_variance() {
        let x = array![[3.0, 3.0], [3.0, 3.0]];
        assert_eq!(Gamma::Scale.resolve(&x).unwrap(), 1.0);
    }

    #[test]
    fn test_gamma_value_validation() {
        let x = array![[1.0]];
        assert_eq!(Gamma::Value(0.25).resolve(&x).unwrap(), 0.25);
        assert!(Gamma::Value(0.0).resolve(&x).is_err());
        assert!(Gamma::Value(f64::NAN).resolve(&x).is_err());
    }
}
