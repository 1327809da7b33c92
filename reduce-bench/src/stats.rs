use serde::{Deserialize, Serialize};

/// Timing summary of the measured iterations of one configuration, in
/// seconds. Samples are taken as recorded: warmup runs never reach this
/// type and no measured run is discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub cv_percent: f64,
    pub sample_count: usize,
}

/// Summarize `samples`. The deviation is the sample (n-1) deviation; a
/// single sample has none.
pub fn compute_stats(samples: &[f64]) -> Stats {
    let Some((&first, rest)) = samples.split_first() else {
        return Stats::default();
    };
    let count = samples.len();
    let (min, max) = rest
        .iter()
        .fold((first, first), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let mean = samples.iter().sum::<f64>() / count as f64;
    let stddev = if count > 1 {
        let sq: f64 = samples.iter().map(|s| (s - mean).powi(2)).sum();
        (sq / (count - 1) as f64).sqrt()
    } else {
        0.0
    };
    let cv_percent = if mean > 0.0 { stddev / mean * 100.0 } else { 0.0 };

    Stats {
        mean,
        stddev,
        min,
        max,
        cv_percent,
        sample_count: count,
    }
}
