//! Summary output comparing the two device strategies.
//!
//! Verdict on smart-over-stupid speedup:
//!   >5x = DOMINANT, 2-5x = SOLID, 1-2x = MARGINAL, <1x = SLOWER

use crate::harness::{format_size, WorkloadRun};
use crate::strategy::ReductionStrategy;

/// Classify a speedup value into a verdict string.
pub fn verdict(speedup: f64) -> &'static str {
    if speedup > 5.0 {
        "DOMINANT"
    } else if speedup >= 2.0 {
        "SOLID"
    } else if speedup >= 1.0 {
        "MARGINAL"
    } else {
        "SLOWER"
    }
}

/// ANSI color code for a verdict.
fn verdict_color(v: &str) -> &'static str {
    match v {
        "DOMINANT" => "\x1b[1;32m", // bold green
        "SOLID" => "\x1b[36m",      // cyan
        "MARGINAL" => "\x1b[33m",   // yellow
        "SLOWER" => "\x1b[31m",     // red
        _ => "\x1b[0m",
    }
}

const RESET: &str = "\x1b[0m";

/// Smart-strategy speedup over the stupid strategy, when both ran.
pub fn smart_speedup(run: &WorkloadRun) -> Option<f64> {
    let mean_of = |label: &str| {
        run.measurements
            .iter()
            .find(|m| m.name == label)
            .map(|m| m.stats.mean)
    };
    let stupid = mean_of(ReductionStrategy::Stupid { chunk_size: 1 }.label())?;
    let smart = mean_of(ReductionStrategy::Smart.label())?;
    (smart > 0.0).then(|| stupid / smart)
}

/// Print a summary of all runs with verdicts.
pub fn print_summary(runs: &[WorkloadRun]) {
    if runs.is_empty() {
        return;
    }

    println!("\n{}", "=".repeat(70));
    println!("  SUMMARY (smart vs. stupid)");
    println!("{}", "=".repeat(70));
    println!(
        "  {:<12} {:>10} {:>10} {:>12}  {}",
        "Workload", "Size", "Speedup", "Failures", "Verdict"
    );
    println!("  {}", "-".repeat(66));

    for run in runs {
        let size_str = format_size(run.size);
        match smart_speedup(run) {
            Some(speedup) => {
                let v = verdict(speedup);
                println!(
                    "  {:<12} {:>10} {:>9.1}x {:>12}  {}{}{}",
                    run.workload,
                    size_str,
                    speedup,
                    run.failures.len(),
                    verdict_color(v),
                    v,
                    RESET,
                );
            }
            None => println!(
                "  {:<12} {:>10} {:>10} {:>12}  -",
                run.workload,
                size_str,
                "-",
                run.failures.len()
            ),
        }
    }

    println!("{}", "=".repeat(70));
    println!();
}
