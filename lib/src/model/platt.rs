//! Platt scaling: maps decision values to `P(malignant)` through
//! `1 / (1 + exp(A * f + B))`.

use crate::model::error::FitError;
use serde::{Deserialize, Serialize};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
const SIGMA: f64 = 1e-12;
const EPS: f64 = 1e-5;

/// Probabilities are clamped away from 0 and 1.
pub const PROBABILITY_FLOOR: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattSigmoid {
    pub a: f64,
    pub b: f64,
}

impl PlattSigmoid {
    /// Fit `A` and `B` by Newton's method with backtracking on the regularised
    /// cross-entropy of `decision_values` against `positive` labels.
    pub fn fit(decision_values: &[f64], positive: &[bool]) -> Result<Self, FitError> {
        if decision_values.len() != positive.len() {
            return Err(FitError::LengthMismatch {
                rows: decision_values.len(),
                labels: positive.len(),
            });
        }
        if decision_values.is_empty() {
            return Err(FitError::EmptyData);
        }

        let prior1 = positive.iter().filter(|&&p| p).count() as f64;
        let prior0 = positive.len() as f64 - prior1;
        let hi = (prior1 + 1.0) / (prior1 + 2.0);
        let lo = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = positive.iter().map(|&p| if p { hi } else { lo }).collect();

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(decision_values, &targets, a, b);

        for _ in 0..MAX_ITER {
            let (mut h11, mut h22, mut h21) = (SIGMA, SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);
            for (&f, &t) in decision_values.iter().zip(&targets) {
                let z = f * a + b;
                let (p, q) = if z >= 0.0 {
                    let e = (-z).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = z.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < EPS && g2.abs() < EPS {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(decision_values, &targets, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }
            if step < MIN_STEP {
                tracing::debug!("Platt line search stopped at the minimum step");
                break;
            }
        }

        if !(a.is_finite() && b.is_finite()) {
            return Err(FitError::Numerical(
                "sigmoid calibration produced non-finite coefficients".to_string(),
            ));
        }
        Ok(Self { a, b })
    }

    /// `P(malignant | f)`, clamped to `[1e-7, 1 - 1e-7]`.
    pub fn probability(&self, decision_value: f64) -> f64 {
        let z = decision_value * self.a + self.b;
        let p = if z >= 0.0 {
            let e = (-z).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + z.exp())
        };
        p.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR)
    }
}

fn objective(decision_values: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    decision_values
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let z = f * a + b;
            if z >= 0.0 {
                t * z + (-z).exp().ln_1p()
            } else {
                (t - 1.0) * z + z.exp().ln_1p()
            }
        })
        .sum()
}
