//! The jointly fitted scaler and classifier, and their stored form.
//!
//! Each key holds an envelope:
//!
//! ```text
//! { format_version: u32, pair_id: String, params: Vec<u8> }
//! ```
//!
//! `pair_id` is the hex SHA-256 of both parameter payloads, so the two
//! envelopes written by one fitting run carry the same id and an envelope
//! from a different run (or with damaged params) is detected on load.

use crate::features::{FeatureVector, Prediction, N_FEATURES};
use crate::model::{Fitted, InferenceModel, ModelError, Svc, SvcParams};
use crate::preprocessing::{FittedStandardScaler, FittedTransformer, PreprocessingError, StandardScalerParams};
use crate::serialization::SerializableParams;
use crate::store::{ArtifactKey, ArtifactStore, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bumped whenever the stored parameter layout changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("artifact `{missing}` is missing while its pair is present")]
    Incomplete { missing: ArtifactKey },

    #[error("artifact `{key}` is corrupt: {reason}")]
    Corrupt { key: ArtifactKey, reason: String },

    #[error("artifact `{key}` has format version {found}, expected {expected}")]
    VersionMismatch {
        key: ArtifactKey,
        expected: u32,
        found: u32,
    },

    #[error("scaler and model come from different fitting runs")]
    Mismatch,

    #[error("artifact `{key}` holds invalid parameters: {reason}")]
    Invalid { key: ArtifactKey, reason: String },

    #[error("failed to encode artifact `{key}`: {reason}")]
    Encode { key: ArtifactKey, reason: String },
}

/// Failures while standardizing or classifying a validated sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("standardization failed: {0}")]
    Preprocessing(#[from] PreprocessingError),

    #[error("classification failed: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    pair_id: String,
    params: Vec<u8>,
}

/// Scaler and classifier that were fitted together.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    scaler: FittedStandardScaler,
    model: Svc<Fitted>,
}

/// Bytes for both keys of one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPair {
    pub scaler: Vec<u8>,
    pub model: Vec<u8>,
}

impl ArtifactPair {
    /// Both halves must agree on the feature count used by [`FeatureVector`].
    pub fn new(scaler: FittedStandardScaler, model: Svc<Fitted>) -> Result<Self, ArtifactError> {
        if scaler.n_features_in() != N_FEATURES {
            return Err(ArtifactError::Invalid {
                key: ArtifactKey::Scaler,
                reason: format!(
                    "expected {} features, scaler has {}",
                    N_FEATURES,
                    scaler.n_features_in()
                ),
            });
        }
        if model.n_features() != N_FEATURES {
            return Err(ArtifactError::Invalid {
                key: ArtifactKey::Model,
                reason: format!(
                    "expected {} features, model has {}",
                    N_FEATURES,
                    model.n_features()
                ),
            });
        }
        Ok(Self { scaler, model })
    }

    pub fn scaler(&self) -> &FittedStandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &Svc<Fitted> {
        &self.model
    }

    /// Standardize, evaluate the decision function and derive the confidence.
    pub fn classify(&self, sample: &FeatureVector) -> Result<Prediction, InferenceError> {
        let scaled = self.scaler.transform_row(sample)?;
        Ok(self.model.classify(scaled.view())?)
    }

    pub fn encode(&self) -> Result<EncodedPair, ArtifactError> {
        let scaler_params = self
            .scaler
            .extract_params()
            .to_bytes()
            .map_err(|e| encode_error(ArtifactKey::Scaler, e))?;
        let model_params = self
            .model
            .extract_params()
            .to_bytes()
            .map_err(|e| encode_error(ArtifactKey::Model, e))?;
        let pair_id = pair_id(&scaler_params, &model_params);

        let wrap = |key: ArtifactKey, params: Vec<u8>| {
            Envelope {
                format_version: FORMAT_VERSION,
                pair_id: pair_id.clone(),
                params,
            }
            .to_bytes()
            .map_err(|e| encode_error(key, e))
        };
        Ok(EncodedPair {
            scaler: wrap(ArtifactKey::Scaler, scaler_params)?,
            model: wrap(ArtifactKey::Model, model_params)?,
        })
    }

    pub fn decode(encoded: &EncodedPair) -> Result<Self, ArtifactError> {
        let scaler_env = open_envelope(ArtifactKey::Scaler, &encoded.scaler)?;
        let model_env = open_envelope(ArtifactKey::Model, &encoded.model)?;

        if scaler_env.pair_id != model_env.pair_id {
            return Err(ArtifactError::Mismatch);
        }
        if pair_id(&scaler_env.params, &model_env.params) != scaler_env.pair_id {
            return Err(ArtifactError::Corrupt {
                key: ArtifactKey::Model,
                reason: "pair digest does not match the stored parameters".to_string(),
            });
        }

        let scaler_params = StandardScalerParams::from_bytes(&scaler_env.params)
            .map_err(|e| corrupt(ArtifactKey::Scaler, e))?;
        let model_params =
            SvcParams::from_bytes(&model_env.params).map_err(|e| corrupt(ArtifactKey::Model, e))?;

        let scaler = FittedStandardScaler::from_params(scaler_params).map_err(|e| {
            ArtifactError::Invalid {
                key: ArtifactKey::Scaler,
                reason: e.to_string(),
            }
        })?;
        let model = Svc::<Fitted>::from_params(model_params).map_err(|e| ArtifactError::Invalid {
            key: ArtifactKey::Model,
            reason: e.to_string(),
        })?;
        Self::new(scaler, model)
    }

    /// Write both keys; the scaler goes first.
    ///
    /// If the model write fails the scaler just written is removed again, so
    /// the store never holds half of a new pair.
    pub fn save_to<S: ArtifactStore + ?Sized>(&self, store: &S) -> Result<(), ArtifactError> {
        let encoded = self.encode()?;
        store.save(ArtifactKey::Scaler, &encoded.scaler)?;
        if let Err(e) = store.save(ArtifactKey::Model, &encoded.model) {
            if let Err(cleanup) = store.remove(ArtifactKey::Scaler) {
                warn!(error = %cleanup, "could not remove scaler after failed model write");
            }
            return Err(e.into());
        }
        info!(
            scaler_bytes = encoded.scaler.len(),
            model_bytes = encoded.model.len(),
            "persisted artifact pair"
        );
        Ok(())
    }

    /// `Ok(None)` when the store holds neither key.
    pub fn load_from<S: ArtifactStore + ?Sized>(store: &S) -> Result<Option<Self>, ArtifactError> {
        let scaler = store.load(ArtifactKey::Scaler)?;
        let model = store.load(ArtifactKey::Model)?;
        match (scaler, model) {
            (None, None) => {
                debug!("artifact store is empty");
                Ok(None)
            }
            (Some(_), None) => Err(ArtifactError::Incomplete {
                missing: ArtifactKey::Model,
            }),
            (None, Some(_)) => Err(ArtifactError::Incomplete {
                missing: ArtifactKey::Scaler,
            }),
            (Some(scaler), Some(model)) => Self::decode(&EncodedPair { scaler, model }).map(Some),
        }
    }
}

fn open_envelope(key: ArtifactKey, bytes: &[u8]) -> Result<Envelope, ArtifactError> {
    let envelope = Envelope::from_bytes(bytes).map_err(|e| corrupt(key, e))?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            key,
            expected: FORMAT_VERSION,
            found: envelope.format_version,
        });
    }
    Ok(envelope)
}

fn pair_id(scaler_params: &[u8], model_params: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((scaler_params.len() as u64).to_le_bytes());
    hasher.update(scaler_params);
    hasher.update(model_params);
    hex::encode(hasher.finalize())
}

fn corrupt(key: ArtifactKey, e: bincode::Error) -> ArtifactError {
    ArtifactError::Corrupt {
        key,
        reason: e.to_string(),
    }
}

fn encode_error(key: ArtifactKey, e: bincode::Error) -> ArtifactError {
    ArtifactError::Encode {
        key,
        reason: e.to_string(),
    }
}
