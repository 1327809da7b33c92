//! Per-configuration report lines on stdout.

use crate::harness::{format_size, Measurement};
use crate::workloads::Workload;

/// The three lines printed for a finished configuration.
pub fn measurement_lines(m: &Measurement) -> [String; 3] {
    [
        format!("{}: {:.6}+-{:.6} s", m.name, m.stats.mean, m.stats.stddev),
        format!("{}: {:.2} millions/s", m.name, m.millions_per_sec()),
        format!("{}: {:.3} GFlops", m.name, m.gflops()),
    ]
}

pub fn print_measurement(m: &Measurement) {
    for line in measurement_lines(m) {
        println!("{line}");
    }
}

pub fn workload_header(workload: Workload, size: usize, iterations: u32) -> String {
    format!(
        "=== {} @ {} ({} iterations) ===",
        workload,
        format_size(size),
        iterations
    )
}
