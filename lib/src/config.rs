//! Configuration loaded from a TOML file.
//!
//! ```toml
//! [artifacts]
//! dir = "artifacts"
//!
//! [dataset]
//! # path = "data/wdbc.csv"   # embedded corpus when absent
//!
//! [fitting]
//! test_size = 0.2
//! seed = 42
//! c = 1.0
//! gamma = "scale"            # or a positive number
//! tolerance = 1e-3
//! ```
//!
//! Every key is optional; the defaults reproduce the reference fitting run.

use crate::dataset::{CorpusSource, CsvCorpus};
use crate::fitting::{FittingConfig, FittingStage};
use crate::model::Gamma;
use crate::pipeline::Pipeline;
use crate::store::FsArtifactStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("`{key}` {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CytoscanConfig {
    pub artifacts: ArtifactsSection,
    pub dataset: DatasetSection,
    pub fitting: FittingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsSection {
    pub dir: PathBuf,
}

impl Default for ArtifactsSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FittingSection {
    pub test_size: f64,
    pub seed: u64,
    pub c: f64,
    pub gamma: GammaSetting,
    pub tolerance: f64,
}

impl Default for FittingSection {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            c: 1.0,
            gamma: GammaSetting::Named("scale".to_string()),
            tolerance: 1e-3,
        }
    }
}

/// `gamma = "scale"` or `gamma = 0.05`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GammaSetting {
    Value(f64),
    Named(String),
}

impl CytoscanConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Check ranges without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fitting_config().map(|_| ())
    }

    pub fn fitting_config(&self) -> Result<FittingConfig, ConfigError> {
        let f = &self.fitting;
        if !(f.test_size > 0.0 && f.test_size < 1.0) {
            return Err(invalid("fitting.test_size", "must lie strictly between 0 and 1"));
        }
        if !(f.c.is_finite() && f.c > 0.0) {
            return Err(invalid("fitting.c", "must be finite and positive"));
        }
        if !(f.tolerance.is_finite() && f.tolerance > 0.0) {
            return Err(invalid("fitting.tolerance", "must be finite and positive"));
        }
        let gamma = match &f.gamma {
            GammaSetting::Named(name) if name == "scale" => Gamma::Scale,
            GammaSetting::Named(name) => {
                return Err(ConfigError::Invalid {
                    key: "fitting.gamma",
                    reason: format!("must be \"scale\" or a number, got {:?}", name),
                })
            }
            GammaSetting::Value(g) if g.is_finite() && *g > 0.0 => Gamma::Value(*g),
            GammaSetting::Value(_) => {
                return Err(invalid("fitting.gamma", "must be finite and positive"))
            }
        };
        Ok(FittingConfig {
            test_size: f.test_size,
            seed: f.seed,
            c: f.c,
            gamma,
            tolerance: f.tolerance,
        })
    }

    pub fn corpus_source(&self) -> CorpusSource {
        match &self.dataset.path {
            Some(path) => CorpusSource::Csv(CsvCorpus::new(path)),
            None => CorpusSource::Embedded,
        }
    }

    pub fn artifact_store(&self) -> FsArtifactStore {
        FsArtifactStore::new(&self.artifacts.dir)
    }

    /// Filesystem-backed pipeline described by this configuration.
    pub fn build_pipeline(&self) -> Result<Pipeline<FsArtifactStore, CorpusSource>, ConfigError> {
        let stage = FittingStage::new(self.fitting_config()?);
        Ok(Pipeline::with_stage(
            self.artifact_store(),
            self.corpus_source(),
            stage,
        ))
    }
}

impl FromStr for CytoscanConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: CytoscanConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CytoscanConfig = "".parse().unwrap();
        assert_eq!(config, CytoscanConfig::default());
        assert_eq!(config.fitting_config().unwrap(), FittingConfig::default());
        assert!(matches!(config.corpus_source(), CorpusSource::Embedded));
        assert_eq!(config.artifact_store().dir(), Path::new("artifacts"));
    }

    #[test]
    fn test_full_config() {
        let config: CytoscanConfig = r#"
            [artifacts]
            dir = "/tmp/cytoscan"

            [dataset]
            path = "corpus.csv"

            [fitting]
            test_size = 0.25
            seed = 7
            c = 2.0
            gamma = 0.05
            tolerance = 1e-4
        "#
        .parse()
        .unwrap();

        let fitting = config.fitting_config().unwrap();
        assert_eq!(fitting.test_size, 0.25);
        assert_eq!(fitting.seed, 7);
        assert_eq!(fitting.c, 2.0);
        assert_eq!(fitting.gamma, Gamma::Value(0.05));
        assert_eq!(fitting.tolerance, 1e-4);
        match config.corpus_source() {
            CorpusSource::Csv(csv) => assert_eq!(csv.path(), Path::new("corpus.csv")),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_integer_gamma_is_accepted() {
        let config: CytoscanConfig = "[fitting]\ngamma = 1".parse().unwrap();
        assert_eq!(config.fitting_config().unwrap().gamma, Gamma::Value(1.0));
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let cases = [
            ("[fitting]\ntest_size = 1.0", "fitting.test_size"),
            ("[fitting]\nc = 0.0", "fitting.c"),
            ("[fitting]\ntolerance = -1.0", "fitting.tolerance"),
            ("[fitting]\ngamma = \"auto\"", "fitting.gamma"),
            ("[fitting]\ngamma = -0.5", "fitting.gamma"),
        ];
        for (toml, key) in cases {
            match toml.parse::<CytoscanConfig>() {
                Err(ConfigError::Invalid { key: k, .. }) => assert_eq!(k, key, "{}", toml),
                other => panic!("{}: expected invalid {}, got {:?}", toml, key, other),
            }
        }
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(matches!(
            "[fitting]\nkernel = \"linear\"".parse::<CytoscanConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fitting]\nseed = 3").unwrap();
        let config = CytoscanConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.fitting.seed, 3);

        assert!(matches!(
            CytoscanConfig::load_from_file("/no/such/cytoscan.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
