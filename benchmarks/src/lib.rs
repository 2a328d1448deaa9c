//! Benchmark and evaluation helpers for cytoscan.
//!
//! - Repeated fitting runs over a list of seeds (accuracy, fit time)
//! - Single-sample prediction latency statistics

pub mod evaluation;
pub mod utils;

pub use evaluation::{parse_seeds, run_seed, summarize, SeedRun, Summary};
pub use utils::{time_fn, LatencyStats};
