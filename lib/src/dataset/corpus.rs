//! Loaders for the Wisconsin diagnostic breast-cancer corpus.
//!
//! The corpus has 569 samples (357 benign, 212 malignant) with the 30 features
//! listed in [`FEATURE_NAMES`]. A copy ships inside the crate, so fitting never
//! depends on the network or the working directory.
//!
//! CSV layout: a header row with the 30 feature names followed by `diagnosis`,
//! then one row per sample. The diagnosis column accepts `M`/`B` or `1`/`0`.

use super::{DatasetError, DatasetProvider, LabeledDataset};
use crate::features::{Diagnosis, FEATURE_NAMES, N_FEATURES};
use csv::ReaderBuilder;
use ndarray::Array2;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const EMBEDDED_CSV: &str = include_str!("../../data/wdbc.csv");

/// The reference corpus bundled with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCorpus;

impl DatasetProvider for EmbeddedCorpus {
    fn load(&self) -> Result<LabeledDataset, DatasetError> {
        parse_csv(EMBEDDED_CSV.as_bytes())
    }
}

/// A corpus in the same CSV layout read from disk.
#[derive(Debug, Clone)]
pub struct CsvCorpus {
    path: PathBuf,
}

impl CsvCorpus {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetProvider for CsvCorpus {
    fn load(&self) -> Result<LabeledDataset, DatasetError> {
        debug!(path = %self.path.display(), "loading reference corpus");
        let file = std::fs::File::open(&self.path).map_err(csv::Error::from)?;
        parse_csv(std::io::BufReader::new(file))
    }
}

/// Provider selected at runtime, e.g. from configuration.
#[derive(Debug, Clone, Default)]
pub enum CorpusSource {
    #[default]
    Embedded,
    Csv(CsvCorpus),
}

impl DatasetProvider for CorpusSource {
    fn load(&self) -> Result<LabeledDataset, DatasetError> {
        match self {
            CorpusSource::Embedded => EmbeddedCorpus.load(),
            CorpusSource::Csv(corpus) => corpus.load(),
        }
    }
}

fn parse_csv<R: Read>(reader: R) -> Result<LabeledDataset, DatasetError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let expected = FEATURE_NAMES.iter().copied().chain(std::iter::once("diagnosis"));
    for (column, name) in expected.enumerate() {
        let found = headers.get(column).unwrap_or("").trim();
        if found != name {
            return Err(DatasetError::Header {
                column,
                expected: name,
                found: found.to_string(),
            });
        }
    }

    let mut flat = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != N_FEATURES + 1 {
            return Err(DatasetError::InvalidRow {
                row,
                message: format!("expected {} fields, got {}", N_FEATURES + 1, record.len()),
            });
        }
        for (column, field) in record.iter().take(N_FEATURES).enumerate() {
            let value: f64 = field.trim().parse().map_err(|_| DatasetError::InvalidRow {
                row,
                message: format!(
                    "column {} (`{}`) is not a number: {:?}",
                    column, FEATURE_NAMES[column], field
                ),
            })?;
            flat.push(value);
        }
        labels.push(parse_diagnosis(&record[N_FEATURES]).ok_or_else(|| {
            DatasetError::InvalidRow {
                row,
                message: format!("unknown diagnosis {:?}", &record[N_FEATURES]),
            }
        })?);
    }

    let features = Array2::from_shape_vec((labels.len(), N_FEATURES), flat).map_err(|e| {
        DatasetError::InvalidRow {
            row: labels.len(),
            message: e.to_string(),
        }
    })?;
    LabeledDataset::new(features, labels)
}

fn parse_diagnosis(field: &str) -> Option<Diagnosis> {
    match field.trim() {
        "M" | "m" | "1" => Some(Diagnosis::Malignant),
        "B" | "b" | "0" => Some(Diagnosis::Benign),
        _ => None,
    }
}
