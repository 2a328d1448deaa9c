//! Diagnose a sample with a filesystem-backed pipeline
//!
//! The first run fits the scaler and classifier on the embedded reference
//! corpus and writes them to the configured artifact directory; later runs load
//! them from there.
//!
//! Run with: cargo run --example diagnose -- [config.toml] [30 comma-separated values]
//!
//! Set `RUST_LOG=cytoscan=debug` for solver and calibration detail.

use cytoscan::{ArtifactSource, CytoscanConfig, FEATURE_NAMES};
use serde_json::json;
use std::error::Error;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/cytoscan.toml";

/// First row of the reference corpus, a confirmed malignant mass.
const MALIGNANT_SAMPLE: [f64; 30] = [
    17.99, 10.38, 122.8, 1001.0, 0.1184, 0.2776, 0.3001, 0.1471, 0.2419, 0.07871, 1.095, 0.9053,
    8.589, 153.4, 0.006399, 0.04904, 0.05373, 0.01587, 0.03003, 0.006193, 25.38, 17.33, 184.6,
    2019.0, 0.1622, 0.6656, 0.7119, 0.2654, 0.4601, 0.1189,
];

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => CytoscanConfig::load_from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => CytoscanConfig::load_from_file(DEFAULT_CONFIG)?,
        None => CytoscanConfig::default(),
    };

    let sample: Vec<f64> = match args.next() {
        Some(values) => values
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()?,
        None => MALIGNANT_SAMPLE.to_vec(),
    };

    let pipeline = config.build_pipeline()?;
    let resolved = pipeline.resolve()?;
    match &resolved.source {
        ArtifactSource::Store => println!("Loaded artifacts from {}", config.artifacts.dir.display()),
        ArtifactSource::Fitted(report) => {
            println!("Fitted new artifacts:");
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    let prediction = pipeline.predict(&sample)?;

    println!("\nInput:");
    for (name, value) in FEATURE_NAMES.iter().zip(&sample) {
        println!("  {:<24} {}", name, value);
    }
    println!("\nResult:");
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "label": prediction.label(),
            "diagnosis": prediction.diagnosis.to_string(),
            "confidence": prediction.confidence,
            "probability_malignant": prediction.probability_malignant,
        }))?
    );

    Ok(())
}
