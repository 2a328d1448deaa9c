//! The one-off fitting run that produces an [`ArtifactPair`].
//!
//! 1. Stratified split of the reference corpus.
//! 2. Scaler fitted on the training partition only.
//! 3. Both partitions standardized with that scaler.
//! 4. Calibrated classifier fitted on the standardized training rows.
//! 5. Accuracy on both partitions reported.

use crate::artifact::{ArtifactError, ArtifactPair};
use crate::dataset::{DatasetError, LabeledDataset};
use crate::metrics::{accuracy, ConfusionMatrix};
use crate::model::{FitError, Gamma, InferenceModel, ModelError, Svc};
use crate::preprocessing::{FittedTransformer, PreprocessingError, StandardScaler, Transformer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingConfig {
    /// Share of the corpus held out for evaluation.
    pub test_size: f64,
    /// Seed for the split and the calibration folds.
    pub seed: u64,
    pub c: f64,
    pub gamma: Gamma,
    pub tolerance: f64,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            c: 1.0,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
        }
    }
}

#[derive(Debug, Error)]
pub enum FittingError {
    #[error("reference dataset unavailable: {0}")]
    Dataset(#[from] DatasetError),

    #[error("scaler fitting failed: {0}")]
    Preprocessing(#[from] PreprocessingError),

    #[error("classifier fitting failed: {0}")]
    Fit(#[from] FitError),

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] ModelError),

    #[error("could not assemble artifacts: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Summary of a fitting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub n_train: usize,
    pub n_test: usize,
    pub n_support: usize,
    pub gamma: f64,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub test_confusion: ConfusionMatrix,
}

#[derive(Debug, Clone)]
pub struct FittedArtifacts {
    pub pair: ArtifactPair,
    pub report: FitReport,
}

#[derive(Debug, Clone, Default)]
pub struct FittingStage {
    config: FittingConfig,
}

impl FittingStage {
    pub fn new(config: FittingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FittingConfig {
        &self.config
    }

    /// Deterministic for a given corpus and configuration.
    pub fn fit(&self, dataset: &LabeledDataset) -> Result<FittedArtifacts, FittingError> {
        let cfg = &self.config;
        let (train, test) = dataset.stratified_split(cfg.test_size, cfg.seed)?;

        let scaler = StandardScaler::new().fit(train.features())?;
        let x_train = scaler.transform(train.features())?;
        let x_test = scaler.transform(test.features())?;

        let model = Svc::new()
            .c(cfg.c)
            .gamma(cfg.gamma)
            .tolerance(cfg.tolerance)
            .seed(cfg.seed)
            .probability(true)
            .fit(&x_train, train.labels())?;

        let train_pred = model.predict_batch(&x_train)?;
        let test_pred = model.predict_batch(&x_test)?;
        let report = FitReport {
            n_train: train.len(),
            n_test: test.len(),
            n_support: model.n_support(),
            gamma: model.gamma(),
            train_accuracy: accuracy(train.labels(), &train_pred),
            test_accuracy: accuracy(test.labels(), &test_pred),
            test_confusion: ConfusionMatrix::from_predictions(test.labels(), &test_pred),
        };
        info!(
            n_train = report.n_train,
            n_test = report.n_test,
            n_support = report.n_support,
            train_accuracy = report.train_accuracy,
            test_accuracy = report.test_accuracy,
            "fitting run complete"
        );

        Ok(FittedArtifacts {
            pair: ArtifactPair::new(scaler, model)?,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::corpus::EmbeddedCorpus;
    use crate::dataset::DatasetProvider;
    use crate::features::tests::MALIGNANT_SAMPLE;
    use crate::features::{Diagnosis, FeatureVector};

    #[test]
    fn test_reference_fit_quality() {
        let corpus = EmbeddedCorpus.load().unwrap();
        let fitted = FittingStage::default().fit(&corpus).unwrap();
        let report = &fitted.report;

        assert_eq!(report.n_train, 455);
        assert_eq!(report.n_test, 114);
        assert!(report.train_accuracy >= 0.95, "{:?}", report);
        assert!(report.test_accuracy >= 0.93, "{:?}", report);
        assert_eq!(report.test_confusion.total(), 114);

        let sample = FeatureVector::new(MALIGNANT_SAMPLE).unwrap();
        let prediction = fitted.pair.classify(&sample).unwrap();
        assert_eq!(prediction.diagnosis, Diagnosis::Malignant);
        assert!(prediction.confidence >= 0.9, "{:?}", prediction);
    }

    #[test]
    fn test_fit_is_reproducible() {
        let corpus = EmbeddedCorpus.load().unwrap();
        let stage = FittingStage::default();
        let a = stage.fit(&corpus).unwrap();
        let b = stage.fit(&corpus).unwrap();

        assert_eq!(a.report, b.report);
        assert_eq!(
            a.pair.scaler().extract_params(),
            b.pair.scaler().extract_params()
        );
        assert_eq!(a.pair.model().extract_params(), b.pair.model().extract_params());
    }

    #[test]
    fn test_bad_test_size_is_a_dataset_error() {
        let corpus = EmbeddedCorpus.load().unwrap();
        let stage = FittingStage::new(FittingConfig {
            test_size: 1.5,
            ..FittingConfig::default()
        });
        assert!(matches!(
            stage.fit(&corpus),
            Err(FittingError::Dataset(DatasetError::InvalidTestSize(_)))
        ));
    }

    #[test]
    fn test_bad_c_is_a_fit_error() {
        let corpus = EmbeddedCorpus.load().unwrap();
        let stage = FittingStage::new(FittingConfig {
            c: -1.0,
            ..FittingConfig::default()
        });
        assert!(matches!(
            stage.fit(&corpus),
            Err(FittingError::Fit(FitError::InvalidParameter(_)))
        ));
    }
}
