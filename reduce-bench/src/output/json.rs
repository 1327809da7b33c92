//! JSON output for benchmark results.
//!
//! Serializes every workload run with a device header and timestamp.

use std::fs;
use std::path::Path;

use serde::Serialize;

use reduce_primitives::DeviceInfo;

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::harness::WorkloadRun;

/// JSON output wrapper with device metadata.
#[derive(Serialize)]
struct JsonReport<'a> {
    device: DeviceHeader<'a>,
    timestamp: String,
    config: &'a BenchConfig,
    results: &'a [WorkloadRun],
}

#[derive(Serialize)]
struct DeviceHeader<'a> {
    backend: &'a str,
    name: &'a str,
    kind: String,
    max_group_size: usize,
}

/// Render the report as pretty JSON.
pub fn to_json(
    backend: &str,
    device: &DeviceInfo,
    config: &BenchConfig,
    runs: &[WorkloadRun],
) -> Result<String> {
    let report = JsonReport {
        device: DeviceHeader {
            backend,
            name: &device.name,
            kind: device.kind.to_string(),
            max_group_size: device.max_group_size,
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        config,
        results: runs,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write benchmark results to a JSON file.
pub fn write_json(
    path: &Path,
    backend: &str,
    device: &DeviceInfo,
    config: &BenchConfig,
    runs: &[WorkloadRun],
) -> Result<()> {
    let json = to_json(backend, device, config, runs)?;
    super::csv::ensure_parent(path)?;
    fs::write(path, json).map_err(|source| BenchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "JSON results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reduce_primitives::HostBackend;

    #[test]
    fn test_write_json_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        let config = BenchConfig::default();
        write_json(&path, "host", &HostBackend::host_device(), &config, &[]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["device"]["backend"], "host");
        assert_eq!(value["device"]["kind"], "cpu");
        assert_eq!(value["config"]["seed"], 42);
        assert!(value["results"].as_array().unwrap().is_empty());
        let ts = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
