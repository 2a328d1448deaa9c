//! # cytoscan
//!
//! Benign/malignant classification of breast masses from the 30 cell-nucleus
//! measurements of a fine-needle aspirate, with a calibrated confidence.
//!
//! ## Core Design Principles
//!
//! - **Fitted state is a separate type**: an unfitted scaler or classifier
//!   carries hyperparameters only; `fit` returns a distinct fitted type that
//!   holds just what inference needs and can be turned into plain parameters.
//! - **Artifacts travel as a pair**: the scaler and the classifier are fitted,
//!   stored and loaded together, and a pair mixed from two fitting runs is
//!   rejected on load.
//! - **Explicit pipeline object**: [`Pipeline`] owns its store and dataset
//!   provider, fits at most once, and is safe to share between threads.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cytoscan::{EmbeddedCorpus, MemoryArtifactStore, Pipeline};
//!
//! let pipeline = Pipeline::new(MemoryArtifactStore::new(), EmbeddedCorpus);
//! let sample = [
//!     17.99, 10.38, 122.8, 1001.0, 0.1184, 0.2776, 0.3001, 0.1471, 0.2419, 0.07871,
//!     1.095, 0.9053, 8.589, 153.4, 0.006399, 0.04904, 0.05373, 0.01587, 0.03003, 0.006193,
//!     25.38, 17.33, 184.6, 2019.0, 0.1622, 0.6656, 0.7119, 0.2654, 0.4601, 0.1189,
//! ];
//! let prediction = pipeline.predict(&sample).unwrap();
//! println!("label {} with confidence {:.3}", prediction.label(), prediction.confidence);
//! ```
//!
//! ## Module Structure
//!
//! - `features`: fixed-order feature vectors, diagnosis labels, predictions
//! - `dataset`: the reference corpus, providers and the stratified split
//! - `preprocessing`: z-score standardization
//! - `model`: RBF support vector classifier with Platt calibration
//! - `fitting`: the split → scale → fit → evaluate run
//! - `artifact` / `store`: the persisted pair and where its bytes live
//! - `pipeline`: lazy, lock-guarded inference
//! - `config`: TOML configuration

pub mod artifact;

/// TOML configuration.
pub mod config;

/// Reference data loading and partitioning.
pub mod dataset;

pub mod error;

pub mod features;

/// Producing a fitted scaler and classifier from the reference corpus.
pub mod fitting;

/// Accuracy and confusion matrix.
pub mod metrics;

/// Classifiers with compile-time state safety.
pub mod model;

pub mod pipeline;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Byte encoding of fitted parameters.
pub mod serialization;

/// Artifact persistence backends.
pub mod store;

pub use artifact::{ArtifactError, ArtifactPair, InferenceError};
pub use config::{ConfigError, CytoscanConfig};
pub use dataset::{CorpusSource, CsvCorpus, DatasetProvider, EmbeddedCorpus, LabeledDataset};
pub use error::PipelineError;
pub use features::{Diagnosis, FeatureError, FeatureVector, Prediction, FEATURE_NAMES, N_FEATURES};
pub use fitting::{FitReport, FittingConfig, FittingError, FittingStage};
pub use pipeline::{ArtifactSource, Pipeline, PipelineState};
pub use store::{ArtifactKey, ArtifactStore, FsArtifactStore, MemoryArtifactStore, StoreError};
