//! Sequential minimal optimisation for the C-SVC dual problem.
//!
//! Minimises `0.5 * a^T Q a - e^T a` subject to `0 <= a_i <= C` and `y^T a = 0`,
//! where `Q_ij = y_i y_j K_ij`. Working pairs are picked with second-order
//! information; no shrinking is performed.

use ndarray::{Array1, Array2};
use tracing::{debug, warn};

const TAU: f64 = 1e-12;

pub(crate) struct Solver<'a> {
    gram: &'a Array2<f64>,
    y: &'a [f64],
    c: f64,
    tolerance: f64,
    max_iter: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Solution {
    pub alpha: Array1<f64>,
    pub rho: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl<'a> Solver<'a> {
    /// `y` holds `+1.0` / `-1.0`; `max_iter == 0` selects `max(10_000_000, 100 * l)`.
    pub fn new(gram: &'a Array2<f64>, y: &'a [f64], c: f64, tolerance: f64, max_iter: usize) -> Self {
        let l = y.len();
        let max_iter = if max_iter == 0 {
            10_000_000usize.max(100 * l)
        } else {
            max_iter
        };
        Self {
            gram,
            y,
            c,
            tolerance,
            max_iter,
        }
    }

    #[inline]
    fn q(&self, i: usize, j: usize) -> f64 {
        self.y[i] * self.y[j] * self.gram[[i, j]]
    }

    pub fn solve(&self) -> Solution {
        let l = self.y.len();
        let y = self.y;
        let c = self.c;
        let qd: Vec<f64> = (0..l).map(|i| self.q(i, i)).collect();

        let mut alpha = vec![0.0; l];
        let mut grad = vec![-1.0; l];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            let Some((i, j)) = self.select_working_set(&alpha, &grad, &qd) else {
                converged = true;
                break;
            };
            iterations += 1;

            let (old_i, old_j) = (alpha[i], alpha[j]);
            if y[i] != y[j] {
                let quad = positive(qd[i] + qd[j] + 2.0 * self.q(i, j));
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = alpha[i] - alpha[j];
                alpha[i] += delta;
                alpha[j] += delta;
                if diff > 0.0 {
                    if alpha[j] < 0.0 {
                        alpha[j] = 0.0;
                        alpha[i] = diff;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = -diff;
                }
                if diff > 0.0 {
                    if alpha[i] > c {
                        alpha[i] = c;
                        alpha[j] = c - diff;
                    }
                } else if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = c + diff;
                }
            } else {
                let quad = positive(qd[i] + qd[j] - 2.0 * self.q(i, j));
                let delta = (grad[i] - grad[j]) / quad;
                let sum = alpha[i] + alpha[j];
                alpha[i] -= delta;
                alpha[j] += delta;
                if sum > c {
                    if alpha[i] > c {
                        alpha[i] = c;
                        alpha[j] = sum - c;
                    }
                } else if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = sum;
                }
                if sum > c {
                    if alpha[j] > c {
                        alpha[j] = c;
                        alpha[i] = sum - c;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = sum;
                }
            }

            let delta_i = alpha[i] - old_i;
            let delta_j = alpha[j] - old_j;
            for (k, g) in grad.iter_mut().enumerate() {
                *g += self.q(i, k) * delta_i + self.q(j, k) * delta_j;
            }
        }

        if converged {
            debug!(iterations, "SMO converged");
        } else {
            warn!(iterations, "SMO reached the iteration limit before converging");
        }

        let rho = self.compute_rho(&alpha, &grad);
        Solution {
            alpha: Array1::from(alpha),
            rho,
            iterations,
            converged,
        }
    }

    fn is_upper(&self, a: f64) -> bool {
        a >= self.c
    }

    fn is_lower(a: f64) -> bool {
        a <= 0.0
    }

    /// Returns `None` once the maximal violating pair is within tolerance.
    fn select_working_set(&self, alpha: &[f64], grad: &[f64], qd: &[f64]) -> Option<(usize, usize)> {
        let y = self.y;
        let mut gmax = f64::NEG_INFINITY;
        let mut gmax2 = f64::NEG_INFINITY;
        let mut gmax_idx = None;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..y.len() {
            if y[t] > 0.0 {
                if !self.is_upper(alpha[t]) && -grad[t] >= gmax {
                    gmax = -grad[t];
                    gmax_idx = Some(t);
                }
            } else if !Self::is_lower(alpha[t]) && grad[t] >= gmax {
                gmax = grad[t];
                gmax_idx = Some(t);
            }
        }

        let i = gmax_idx?;
        for j in 0..y.len() {
            if y[j] > 0.0 {
                if !Self::is_lower(alpha[j]) {
                    let grad_diff = gmax + grad[j];
                    if grad[j] >= gmax2 {
                        gmax2 = grad[j];
                    }
                    if grad_diff > 0.0 {
                        let quad = qd[i] + qd[j] - 2.0 * y[i] * self.q(i, j);
                        let obj_diff = -(grad_diff * grad_diff) / positive(quad);
                        if obj_diff <= obj_diff_min {
                            gmin_idx = Some(j);
                            obj_diff_min = obj_diff;
                        }
                    }
                }
            } else if !self.is_upper(alpha[j]) {
                let grad_diff = gmax - grad[j];
                if -grad[j] >= gmax2 {
                    gmax2 = -grad[j];
                }
                if grad_diff > 0.0 {
                    let quad = qd[i] + qd[j] + 2.0 * y[i] * self.q(i, j);
                    let obj_diff = -(grad_diff * grad_diff) / positive(quad);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        if gmax + gmax2 < self.tolerance {
            return None;
        }
        gmin_idx.map(|j| (i, j))
    }

    fn compute_rho(&self, alpha: &[f64], grad: &[f64]) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut n_free = 0usize;
        let mut sum_free = 0.0;

        for (t, (&a, &g)) in alpha.iter().zip(grad).enumerate() {
            let yg = self.y[t] * g;
            if self.is_upper(a) {
                if self.y[t] < 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else if Self::is_lower(a) {
                if self.y[t] > 0.0 {
                    ub = ub.min(yg);
                } else {
                    lb = lb.max(yg);
                }
            } else {
                n_free += 1;
                sum_free += yg;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }
}

#[inline]
fn positive(quad: f64) -> f64 {
    if quad > 0.0 {
        quad
    } else {
        TAU
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::kernel::RbfKernel;
    use ndarray::array;

    fn decision(gram_row: impl Fn(usize) -> f64, sol: &Solution, y: &[f64]) -> f64 {
        sol.alpha
            .iter()
            .enumerate()
            .map(|(i, a)| a * y[i] * gram_row(i))
            .sum::<f64>()
            - sol.rho
    }

    #[test]
    fn test_separates_two_clusters() {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [3.0, 3.0],
            [3.1, 2.8],
            [2.9, 3.2]
        ];
        let y = [-1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let kernel = RbfKernel::new(0.5);
        let gram = kernel.gram(&x);
        let sol = Solver::new(&gram, &y, 1.0, 1e-3, 0).solve();

        assert!(sol.converged);
        for (t, &label) in y.iter().enumerate() {
            let f = decision(|i| gram[[i, t]], &sol, &y);
            assert_eq!(f > 0.0, label > 0.0, "sample {} has decision {}", t, f);
        }
    }

    #[test]
    fn test_box_and_equality_constraints_hold() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [1.5], [2.5], [0.5]];
        let y = [-1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0];
        let gram = RbfKernel::new(1.0).gram(&x);
        let c = 0.7;
        let sol = Solver::new(&gram, &y, c, 1e-3, 0).solve();

        for &a in sol.alpha.iter() {
            assert!((0.0..=c).contains(&a));
        }
        let balance: f64 = sol.alpha.iter().zip(&y).map(|(a, yi)| a * yi).sum();
        assert!(balance.abs() < 1e-9);
    }

    #[test]
    fn test_iteration_cap() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [-1.0, 1.0, -1.0, 1.0];
        let gram = RbfKernel::new(1.0).gram(&x);
        let sol = Solver::new(&gram, &y, 1.0, 1e-12, 1).solve();
        assert_eq!(sol.iterations, 1);
        assert!(!sol.converged);
    }
}
