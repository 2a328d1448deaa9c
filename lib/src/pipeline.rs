//! Lazily initialised inference over a fitted [`ArtifactPair`].
//!
//! ```text
//! Uninitialized ──(pair in store)──────────────► Ready
//! Uninitialized ──► Fitting ──(fit + persist ok)─► Ready
//!                       └───(failure)──────────► Failed (terminal)
//! ```
//!
//! Initialisation runs under a mutex, so concurrent first calls perform at
//! most one fitting run and all observe the same pair. After that the pair is
//! read without locking.

use crate::artifact::ArtifactPair;
use crate::dataset::DatasetProvider;
use crate::error::PipelineError;
use crate::features::{FeatureVector, Prediction};
use crate::fitting::{FitReport, FittingError, FittingStage};
use crate::store::ArtifactStore;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Fitting,
    Ready,
    Failed,
}

/// Where the resolved pair came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    Store,
    Fitted(FitReport),
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub pair: ArtifactPair,
    pub source: ArtifactSource,
}

pub struct Pipeline<S, D> {
    store: S,
    provider: D,
    stage: FittingStage,
    init_lock: Mutex<()>,
    fitting: AtomicBool,
    resolved: OnceLock<Resolved>,
    failure: OnceLock<PipelineError>,
    fit_invocations: AtomicUsize,
}

impl<S: ArtifactStore, D: DatasetProvider> Pipeline<S, D> {
    /// Pipeline with the reference fitting configuration.
    pub fn new(store: S, provider: D) -> Self {
        Self::with_stage(store, provider, FittingStage::default())
    }

    pub fn with_stage(store: S, provider: D, stage: FittingStage) -> Self {
        Self {
            store,
            provider,
            stage,
            init_lock: Mutex::new(()),
            fitting: AtomicBool::new(false),
            resolved: OnceLock::new(),
            failure: OnceLock::new(),
            fit_invocations: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stage(&self) -> &FittingStage {
        &self.stage
    }

    pub fn state(&self) -> PipelineState {
        if self.resolved.get().is_some() {
            PipelineState::Ready
        } else if self.failure.get().is_some() {
            PipelineState::Failed
        } else if self.fitting.load(Ordering::Acquire) {
            PipelineState::Fitting
        } else {
            PipelineState::Uninitialized
        }
    }

    /// Number of fitting runs started by this pipeline.
    pub fn fit_invocations(&self) -> usize {
        self.fit_invocations.load(Ordering::Acquire)
    }

    /// Classify a raw row of measurements.
    ///
    /// The row is validated before artifacts are resolved, so bad input never
    /// triggers a fitting run.
    pub fn predict(&self, raw: &[f64]) -> Result<Prediction, PipelineError> {
        let sample = FeatureVector::from_slice(raw)?;
        self.predict_vector(&sample)
    }

    pub fn predict_vector(&self, sample: &FeatureVector) -> Result<Prediction, PipelineError> {
        let resolved = self.resolve()?;
        Ok(resolved.pair.classify(sample)?)
    }

    pub fn artifacts(&self) -> Result<&ArtifactPair, PipelineError> {
        self.resolve().map(|r| &r.pair)
    }

    /// Load the pair from the store, or fit and persist one.
    ///
    /// Runs at most once per pipeline; later calls return the cached outcome,
    /// including a cached failure.
    pub fn resolve(&self) -> Result<&Resolved, PipelineError> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }

        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }
        if let Some(err) = self.failure.get() {
            return Err(err.clone());
        }

        match self.initialize() {
            Ok(resolved) => Ok(self.resolved.get_or_init(|| resolved)),
            Err(err) => {
                warn!(error = %err, "pipeline initialisation failed");
                Err(self.failure.get_or_init(|| err).clone())
            }
        }
    }

    fn initialize(&self) -> Result<Resolved, PipelineError> {
        match ArtifactPair::load_from(&self.store) {
            Ok(Some(pair)) => {
                info!("loaded artifact pair from store");
                Ok(Resolved {
                    pair,
                    source: ArtifactSource::Store,
                })
            }
            Ok(None) => {
                info!("no stored artifacts; fitting a new pair");
                self.fit_and_persist()
                    .map_err(|e| PipelineError::TrainingFailure(Arc::new(e)))
            }
            Err(cause) => {
                warn!(error = %cause, "stored artifacts rejected; refitting");
                self.fit_and_persist()
                    .map_err(|refit| PipelineError::ArtifactUnavailable {
                        cause: Arc::new(cause),
                        refit: Arc::new(refit),
                    })
            }
        }
    }

    fn fit_and_persist(&self) -> Result<Resolved, FittingError> {
        self.fitting.store(true, Ordering::Release);
        self.fit_invocations.fetch_add(1, Ordering::AcqRel);

        let outcome = self.run_fit();
        self.fitting.store(false, Ordering::Release);
        outcome
    }

    fn run_fit(&self) -> Result<Resolved, FittingError> {
        let dataset = self.provider.load()?;
        let fitted = self.stage.fit(&dataset)?;
        fitted.pair.save_to(&self.store)?;
        Ok(Resolved {
            pair: fitted.pair,
            source: ArtifactSource::Fitted(fitted.report),
        })
    }
}

impl<S, D> std::fmt::Debug for Pipeline<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stage", &self.stage)
            .field("ready", &self.resolved.get().is_some())
            .field("failed", &self.failure.get().is_some())
            .field("fit_invocations", &self.fit_invocations.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetError, EmbeddedCorpus, LabeledDataset};
    use crate::features::tests::MALIGNANT_SAMPLE;
    use crate::store::MemoryArtifactStore;

    struct Unreadable;

    impl DatasetProvider for Unreadable {
        fn load(&self) -> Result<LabeledDataset, DatasetError> {
            Err(DatasetError::Empty)
        }
    }

    #[test]
    fn test_state_transitions_to_ready() {
        let pipeline = Pipeline::new(MemoryArtifactStore::new(), EmbeddedCorpus);
        assert_eq!(pipeline.state(), PipelineState::Uninitialized);

        let resolved = pipeline.resolve().unwrap();
        assert!(matches!(resolved.source, ArtifactSource::Fitted(_)));
        assert_eq!(pipeline.state(), PipelineState::Ready);
        assert_eq!(pipeline.fit_invocations(), 1);
        assert!(!pipeline.store().is_empty());
    }

    #[test]
    fn test_invalid_input_does_not_fit() {
        let pipeline = Pipeline::new(MemoryArtifactStore::new(), EmbeddedCorpus);
        let err = pipeline.predict(&MALIGNANT_SAMPLE[..29]).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(pipeline.fit_invocations(), 0);
        assert_eq!(pipeline.state(), PipelineState::Uninitialized);
    }

    #[test]
    fn test_failure_is_terminal_and_cached() {
        let pipeline = Pipeline::new(MemoryArtifactStore::new(), Unreadable);
        let first = pipeline.predict(&MALIGNANT_SAMPLE).unwrap_err();
        assert!(matches!(first, PipelineError::TrainingFailure(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed);

        let second = pipeline.predict(&MALIGNANT_SAMPLE).unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(pipeline.fit_invocations(), 1);
    }
}
