//! Fit on the reference corpus for several seeds and report held-out quality.
//!
//! Usage: evaluate [seeds]   e.g. `evaluate 42,1,7,123,2024`
//!
//! One JSON object per seed is printed, followed by a summary object.

use benchmarks::evaluation::load_corpus;
use benchmarks::{parse_seeds, run_seed, summarize};
use std::error::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SEEDS: [u64; 5] = [42, 1, 7, 123, 2024];

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let seeds = match std::env::args().nth(1) {
        Some(arg) => parse_seeds(&arg)?,
        None => DEFAULT_SEEDS.to_vec(),
    };

    let corpus = load_corpus()?;
    let mut runs = Vec::with_capacity(seeds.len());
    for seed in seeds {
        let run = run_seed(&corpus, seed)?;
        info!(seed, test_accuracy = run.report.test_accuracy, "seed finished");
        println!("{}", serde_json::to_string(&run)?);
        runs.push(run);
    }

    if let Some(summary) = summarize(&runs) {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
