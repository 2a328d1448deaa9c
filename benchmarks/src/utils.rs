use serde::Serialize;
use std::time::{Duration, Instant};

/// Run a function and measure its execution time.
///
/// Returns `(result, elapsed_time)`.
pub fn time_fn<F, R>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

/// Latency summary in microseconds.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    pub samples: usize,
    pub mean_us: f64,
    pub std_dev_us: f64,
    pub min_us: f64,
    pub max_us: f64,
    pub median_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
}

impl LatencyStats {
    /// `None` for an empty slice.
    pub fn from_times(mut times: Vec<f64>) -> Option<Self> {
        if times.is_empty() {
            return None;
        }
        times.sort_by(f64::total_cmp);

        let n = times.len();
        let mean = times.iter().sum::<f64>() / n as f64;
        let variance = times.iter().map(|&t| (t - mean).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (times[n / 2 - 1] + times[n / 2]) / 2.0
        } else {
            times[n / 2]
        };
        let percentile = |q: f64| times[((n as f64 * q) as usize).min(n - 1)];

        Some(Self {
            samples: n,
            mean_us: mean,
            std_dev_us: variance.sqrt(),
            min_us: times[0],
            max_us: times[n - 1],
            median_us: median,
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
        })
    }
}
