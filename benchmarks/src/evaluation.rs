//! Repeated fitting runs over several seeds.

use crate::utils::{time_fn, LatencyStats};
use cytoscan::{
    DatasetProvider, EmbeddedCorpus, FeatureVector, FitReport, FittingConfig, FittingError,
    FittingStage, LabeledDataset,
};
use serde::Serialize;

/// Outcome of one fitting run.
#[derive(Debug, Clone, Serialize)]
pub struct SeedRun {
    pub seed: u64,
    pub fit_ms: f64,
    pub report: FitReport,
    /// Single-sample `classify` latency over the whole corpus.
    pub predict_latency: Option<LatencyStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub runs: usize,
    pub mean_test_accuracy: f64,
    pub min_test_accuracy: f64,
    pub mean_fit_ms: f64,
}

pub fn load_corpus() -> Result<LabeledDataset, FittingError> {
    Ok(EmbeddedCorpus.load()?)
}

pub fn run_seed(corpus: &LabeledDataset, seed: u64) -> Result<SeedRun, FittingError> {
    let stage = FittingStage::new(FittingConfig {
        seed,
        ..FittingConfig::default()
    });
    let (fitted, elapsed) = time_fn(|| stage.fit(corpus));
    let fitted = fitted?;

    let mut times = Vec::with_capacity(corpus.len());
    for i in 0..corpus.len() {
        let Some(sample) = corpus.sample(i) else {
            continue;
        };
        let (outcome, t) = time_fn(|| fitted.pair.classify(&sample));
        if outcome.is_ok() {
            times.push(t.as_secs_f64() * 1e6);
        }
    }

    Ok(SeedRun {
        seed,
        fit_ms: elapsed.as_secs_f64() * 1000.0,
        report: fitted.report,
        predict_latency: LatencyStats::from_times(times),
    })
}

pub fn summarize(runs: &[SeedRun]) -> Option<Summary> {
    if runs.is_empty() {
        return None;
    }
    let n = runs.len() as f64;
    Some(Summary {
        runs: runs.len(),
        mean_test_accuracy: runs.iter().map(|r| r.report.test_accuracy).sum::<f64>() / n,
        min_test_accuracy: runs
            .iter()
            .map(|r| r.report.test_accuracy)
            .fold(f64::INFINITY, f64::min),
        mean_fit_ms: runs.iter().map(|r| r.fit_ms).sum::<f64>() / n,
    })
}

/// Parse `"1,7,42"` into seeds.
pub fn parse_seeds(arg: &str) -> Result<Vec<u64>, std::num::ParseIntError> {
    arg.split(',').map(|s| s.trim().parse()).collect()
}

/// The canonical malignant sample; handy for latency checks.
pub fn reference_sample() -> Option<FeatureVector> {
    EmbeddedCorpus.load().ok()?.sample(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seeds() {
        assert_eq!(parse_seeds("1, 7,42").unwrap(), vec![1, 7, 42]);
        assert!(parse_seeds("1,x").is_err());
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn test_reference_sample_is_first_row() {
        let sample = reference_sample().unwrap();
        assert_eq!(sample.get("mean_radius"), Some(17.99));
    }
}
