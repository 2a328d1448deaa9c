//! Soft-margin support vector classifier with an RBF kernel.
//!
//! The model follows the same compile-time state tracking as the rest of the crate:
//! - [`Svc<Unfitted>`] carries hyperparameters only and exposes `fit`.
//! - [`Svc<Fitted>`] carries support vectors, dual coefficients, the intercept and
//!   the optional Platt sigmoid, and implements [`InferenceModel`].
//!
//! Labels are encoded as `+1` for [`Diagnosis::Malignant`] and `-1` for
//! [`Diagnosis::Benign`]; a positive decision value means malignant.

use crate::features::{Diagnosis, Prediction};
use crate::model::error::{FitError, ModelError};
use crate::model::kernel::{Gamma, RbfKernel};
use crate::model::platt::PlattSigmoid;
use crate::model::smo::Solver;
use crate::model::InferenceModel;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Hyperparameters of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvcConfig {
    /// Regularization strength `C`.
    pub c: f64,
    pub gamma: Gamma,
    /// Stopping tolerance on the maximal KKT violation.
    pub tolerance: f64,
    /// Fit a Platt sigmoid so that `predict_proba` is available.
    pub probability: bool,
    /// Seed of the permutation used for calibration folds.
    pub seed: u64,
    /// Solver iteration cap; `0` means `max(10_000_000, 100 * n_samples)`.
    pub max_iter: usize,
    pub calibration_folds: usize,
}

impl Default for SvcConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
            probability: true,
            seed: 42,
            max_iter: 0,
            calibration_folds: 5,
        }
    }
}

/// Marker for a classifier that has not been trained.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfitted;

/// Learned state of a trained classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Fitted {
    support_vectors: Array2<f64>,
    /// `alpha_i * y_i` for every support vector.
    dual_coef: Array1<f64>,
    /// Equal to `-rho`.
    intercept: f64,
    kernel: RbfKernel,
    sigmoid: Option<PlattSigmoid>,
}

#[derive(Debug, Clone)]
pub struct Svc<S> {
    config: SvcConfig,
    state: S,
}

/// Alias for an untrained classifier.
pub type SupportVectorClassifier = Svc<Unfitted>;

impl Default for Svc<Unfitted> {
    fn default() -> Self {
        Self::new()
    }
}

impl Svc<Unfitted> {
    /// Classifier with `C = 1.0`, `gamma = "scale"` and calibration enabled.
    pub fn new() -> Self {
        Self::with_config(SvcConfig::default())
    }

    pub fn with_config(config: SvcConfig) -> Self {
        Self {
            config,
            state: Unfitted,
        }
    }

    pub fn config(&self) -> &SvcConfig {
        &self.config
    }

    pub fn c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    pub fn gamma(mut self, gamma: Gamma) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn probability(mut self, probability: bool) -> Self {
        self.config.probability = probability;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    pub fn calibration_folds(mut self, folds: usize) -> Self {
        self.config.calibration_folds = folds;
        self
    }

    /// Train on standardized rows `x` with one label per row.
    ///
    /// # Errors
    /// Returns [`FitError`] if the data is empty, mismatched, non-finite or
    /// contains a single class, if a hyperparameter is out of range, or if the
    /// solver produced a non-finite intercept.
    pub fn fit(&self, x: &Array2<f64>, labels: &[Diagnosis]) -> Result<Svc<Fitted>, FitError> {
        self.validate(x, labels)?;

        let gamma = self.config.gamma.resolve(x)?;
        let kernel = RbfKernel::new(gamma);
        let y: Vec<f64> = labels.iter().map(|d| d.sign()).collect();
        let gram = kernel.gram(x);

        let solution = Solver::new(
            &gram,
            &y,
            self.config.c,
            self.config.tolerance,
            self.config.max_iter,
        )
        .solve();
        if !solution.rho.is_finite() {
            return Err(FitError::Numerical("solver produced a non-finite intercept".to_string()));
        }

        let support: Vec<usize> = (0..y.len()).filter(|&i| solution.alpha[i] > 0.0).collect();
        let dual_coef = Array1::from_iter(support.iter().map(|&i| solution.alpha[i] * y[i]));
        let support_vectors = x.select(Axis(0), &support);

        let sigmoid = if self.config.probability {
            Some(self.calibrate(&gram, &y)?)
        } else {
            None
        };

        info!(
            n_samples = y.len(),
            n_support = support.len(),
            gamma,
            iterations = solution.iterations,
            converged = solution.converged,
            "fitted support vector classifier"
        );

        Ok(Svc {
            config: self.config.clone(),
            state: Fitted {
                support_vectors,
                dual_coef,
                intercept: -solution.rho,
                kernel,
                sigmoid,
            },
        })
    }

    fn validate(&self, x: &Array2<f64>, labels: &[Diagnosis]) -> Result<(), FitError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(FitError::EmptyData);
        }
        if x.nrows() != labels.len() {
            return Err(FitError::LengthMismatch {
                rows: x.nrows(),
                labels: labels.len(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFiniteData);
        }
        if !(self.config.c.is_finite() && self.config.c > 0.0) {
            return Err(FitError::InvalidParameter(format!(
                "C must be finite and positive, got {}",
                self.config.c
            )));
        }
        if !(self.config.tolerance.is_finite() && self.config.tolerance > 0.0) {
            return Err(FitError::InvalidParameter(format!(
                "tolerance must be finite and positive, got {}",
                self.config.tolerance
            )));
        }
        if self.config.probability && self.config.calibration_folds < 2 {
            return Err(FitError::InvalidParameter(format!(
                "calibration needs at least 2 folds, got {}",
                self.config.calibration_folds
            )));
        }
        let first = labels[0];
        if labels.iter().all(|&d| d == first) {
            return Err(FitError::SingleClass(first));
        }
        Ok(())
    }

    /// Cross-validated decision values fed to [`PlattSigmoid::fit`].
    fn calibrate(&self, gram: &Array2<f64>, y: &[f64]) -> Result<PlattSigmoid, FitError> {
        let l = y.len();
        let folds = self.config.calibration_folds;
        let mut perm: Vec<usize> = (0..l).collect();
        perm.shuffle(&mut StdRng::seed_from_u64(self.config.seed));

        let mut decision_values = vec![0.0; l];
        for fold in 0..folds {
            let begin = fold * l / folds;
            let end = (fold + 1) * l / folds;
            let held_out = &perm[begin..end];
            let train: Vec<usize> = perm[..begin].iter().chain(&perm[end..]).copied().collect();
            let sub_y: Vec<f64> = train.iter().map(|&i| y[i]).collect();

            let has_pos = sub_y.iter().any(|&v| v > 0.0);
            let has_neg = sub_y.iter().any(|&v| v < 0.0);
            if !(has_pos && has_neg) {
                let constant = if has_pos { 1.0 } else { -1.0 };
                for &j in held_out {
                    decision_values[j] = constant;
                }
                continue;
            }

            let sub_gram = gram.select(Axis(0), &train).select(Axis(1), &train);
            let sol = Solver::new(
                &sub_gram,
                &sub_y,
                self.config.c,
                self.config.tolerance,
                self.config.max_iter,
            )
            .solve();
            for &j in held_out {
                decision_values[j] = train
                    .iter()
                    .zip(sub_y.iter())
                    .zip(sol.alpha.iter())
                    .map(|((&t, &yt), &a)| a * yt * gram[[t, j]])
                    .sum::<f64>()
                    - sol.rho;
            }
            debug!(fold, held_out = held_out.len(), "calibration fold done");
        }

        let positive: Vec<bool> = y.iter().map(|&v| v > 0.0).collect();
        let sigmoid = PlattSigmoid::fit(&decision_values, &positive)?;
        debug!(a = sigmoid.a, b = sigmoid.b, "fitted Platt sigmoid");
        Ok(sigmoid)
    }
}

impl Svc<Fitted> {
    pub fn config(&self) -> &SvcConfig {
        &self.config
    }

    pub fn n_features(&self) -> usize {
        self.state.support_vectors.ncols()
    }

    pub fn n_support(&self) -> usize {
        self.state.support_vectors.nrows()
    }

    pub fn support_vectors(&self) -> &Array2<f64> {
        &self.state.support_vectors
    }

    pub fn dual_coef(&self) -> &Array1<f64> {
        &self.state.dual_coef
    }

    pub fn intercept(&self) -> f64 {
        self.state.intercept
    }

    pub fn gamma(&self) -> f64 {
        self.state.kernel.gamma()
    }

    pub fn sigmoid(&self) -> Option<&PlattSigmoid> {
        self.state.sigmoid.as_ref()
    }

    fn check_width(&self, got: usize) -> Result<(), ModelError> {
        if got != self.n_features() {
            return Err(ModelError::FeatureMismatch {
                expected_features: self.n_features(),
                got_features: got,
            });
        }
        Ok(())
    }

    /// Signed distance-like score; positive means malignant.
    pub fn decision_function(&self, x: ArrayView1<'_, f64>) -> Result<f64, ModelError> {
        self.check_width(x.len())?;
        let state = &self.state;
        let value = state
            .support_vectors
            .outer_iter()
            .zip(state.dual_coef.iter())
            .map(|(sv, coef)| coef * state.kernel.eval(sv, x))
            .sum::<f64>()
            + state.intercept;
        if !value.is_finite() {
            return Err(ModelError::NonFinite);
        }
        Ok(value)
    }

    pub fn decision_function_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        self.check_width(x.ncols())?;
        x.outer_iter()
            .map(|row| self.decision_function(row))
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    /// `[P(benign), P(malignant)]`.
    pub fn predict_proba(&self, x: ArrayView1<'_, f64>) -> Result<[f64; 2], ModelError> {
        let sigmoid = self.state.sigmoid.ok_or(ModelError::ProbabilityDisabled)?;
        let p = sigmoid.probability(self.decision_function(x)?);
        Ok([1.0 - p, p])
    }

    pub fn predict_proba_batch(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let mut out = Array2::zeros((x.nrows(), 2));
        for (i, row) in x.outer_iter().enumerate() {
            let [p0, p1] = self.predict_proba(row)?;
            out[[i, 0]] = p0;
            out[[i, 1]] = p1;
        }
        Ok(out)
    }

    /// Label from the sign of the decision function, confidence from the
    /// calibrated distribution: `max(P(benign), P(malignant))`.
    pub fn classify(&self, x: ArrayView1<'_, f64>) -> Result<Prediction, ModelError> {
        let sigmoid = self.state.sigmoid.ok_or(ModelError::ProbabilityDisabled)?;
        let f = self.decision_function(x)?;
        let p = sigmoid.probability(f);
        Ok(Prediction {
            diagnosis: diagnosis_from_decision(f),
            confidence: p.max(1.0 - p),
            probability_malignant: p,
        })
    }
}

fn diagnosis_from_decision(f: f64) -> Diagnosis {
    if f > 0.0 {
        Diagnosis::Malignant
    } else {
        Diagnosis::Benign
    }
}

/// Serializable learned state of [`Svc<Fitted>`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvcParams {
    pub n_features: usize,
    pub gamma: f64,
    /// Row-major, `dual_coef.len()` rows of `n_features` values.
    pub support_vectors: Vec<f64>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    pub sigmoid: Option<PlattSigmoid>,
}

impl InferenceModel for Svc<Fitted> {
    type InputSingle = Array1<f64>;
    type OutputSingle = Diagnosis;
    type InputBatch = Array2<f64>;
    type OutputBatch = Vec<Diagnosis>;
    type ParamsRepr = SvcParams;

    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle, ModelError> {
        self.decision_function(input.view()).map(diagnosis_from_decision)
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch, ModelError> {
        Ok(self
            .decision_function_batch(input)?
            .iter()
            .map(|&f| diagnosis_from_decision(f))
            .collect())
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        let state = &self.state;
        SvcParams {
            n_features: self.n_features(),
            gamma: state.kernel.gamma(),
            support_vectors: state.support_vectors.iter().copied().collect(),
            dual_coef: state.dual_coef.to_vec(),
            intercept: state.intercept,
            sigmoid: state.sigmoid,
        }
    }

    /// Hyperparameters that do not survive training are restored to their
    /// defaults; `gamma` is pinned to the learned value.
    fn from_params(params: Self::ParamsRepr) -> Result<Self, ModelError> {
        let invalid = |msg: String| -> Result<Self, ModelError> { Err(ModelError::InvalidParams(msg)) };

        if params.n_features == 0 {
            return invalid("model has zero features".to_string());
        }
        if params.dual_coef.is_empty() {
            return invalid("model has no support vectors".to_string());
        }
        if params.support_vectors.len() != params.dual_coef.len() * params.n_features {
            return invalid(format!(
                "expected {} support vector values, got {}",
                params.dual_coef.len() * params.n_features,
                params.support_vectors.len()
            ));
        }
        if !(params.gamma.is_finite() && params.gamma > 0.0) {
            return invalid(format!("gamma must be finite and positive, got {}", params.gamma));
        }
        let finite = params
            .support_vectors
            .iter()
            .chain(&params.dual_coef)
            .chain(std::iter::once(&params.intercept))
            .all(|v| v.is_finite());
        if !finite {
            return invalid("model contains non-finite values".to_string());
        }
        if let Some(s) = params.sigmoid {
            if !(s.a.is_finite() && s.b.is_finite()) {
                return invalid("sigmoid coefficients are not finite".to_string());
            }
        }

        let support_vectors = Array2::from_shape_vec(
            (params.dual_coef.len(), params.n_features),
            params.support_vectors,
        )
        .map_err(|e| ModelError::InvalidParams(e.to_string()))?;

        let config = SvcConfig {
            gamma: Gamma::Value(params.gamma),
            probability: params.sigmoid.is_some(),
            ..SvcConfig::default()
        };
        Ok(Svc {
            config,
            state: Fitted {
                support_vectors,
                dual_coef: Array1::from(params.dual_coef),
                intercept: params.intercept,
                kernel: RbfKernel::new(params.gamma),
                sigmoid: params.sigmoid,
            },
        })
    }
}
