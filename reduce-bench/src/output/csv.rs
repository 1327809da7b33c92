//! CSV output for benchmark results.
//!
//! One row per configuration with columns:
//! workload,size,configuration,status,mean_s,stddev_s,min_s,max_s,millions_per_s,gflops,cv_pct

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{BenchError, Result};
use crate::harness::WorkloadRun;

pub const CSV_HEADER: &str =
    "workload,size,configuration,status,mean_s,stddev_s,min_s,max_s,millions_per_s,gflops,cv_pct";

/// Create the parent directory of `path` if it is missing.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| BenchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Write all rows to `out`.
pub fn write_rows(out: &mut impl Write, runs: &[WorkloadRun]) -> std::io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for run in runs {
        for m in &run.measurements {
            writeln!(
                out,
                "{},{},{},ok,{:.9},{:.9},{:.9},{:.9},{:.3},{:.4},{:.1}",
                run.workload,
                run.size,
                m.name,
                m.stats.mean,
                m.stats.stddev,
                m.stats.min,
                m.stats.max,
                m.millions_per_sec(),
                m.gflops(),
                m.stats.cv_percent,
            )?;
        }
        for f in &run.failures {
            writeln!(
                out,
                "{},{},{},failed:E{:04},,,,,,,",
                run.workload, run.size, f.name, f.code
            )?;
        }
    }
    Ok(())
}

/// Write benchmark results to a CSV file.
pub fn write_csv(path: &Path, runs: &[WorkloadRun]) -> Result<()> {
    ensure_parent(path)?;
    let io_err = |source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(path).map_err(io_err)?;
    write_rows(&mut file, runs).map_err(io_err)?;
    tracing::info!(path = %path.display(), "CSV results written");
    Ok(())
}
