use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::strategy::ReductionStrategy;
use crate::workloads::Workload;

/// A benchmark profile with preset sizes, iterations, and warmup.
///
/// `runs: None` means each workload uses its own default iteration count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchProfile {
    pub name: String,
    pub sizes: Vec<usize>,
    pub runs: Option<u32>,
    pub warmup: u32,
}

/// Returns the "quick" profile: 1M / 3 runs / no warmup.
pub fn quick_profile() -> BenchProfile {
    BenchProfile {
        name: "quick".to_string(),
        sizes: vec![1_000_000],
        runs: Some(3),
        warmup: 0,
    }
}

/// Returns the "standard" profile: 100M / per-workload runs / no warmup.
pub fn standard_profile() -> BenchProfile {
    BenchProfile {
        name: "standard".to_string(),
        sizes: vec![100_000_000],
        runs: None,
        warmup: 0,
    }
}

/// Returns the "thorough" profile: 1M+10M+100M / 30 runs / 3 warmup.
pub fn thorough_profile() -> BenchProfile {
    BenchProfile {
        name: "thorough".to_string(),
        sizes: vec![1_000_000, 10_000_000, 100_000_000],
        runs: Some(30),
        warmup: 3,
    }
}

/// Lookup a profile by name.
pub fn get_profile(name: &str) -> Option<BenchProfile> {
    match name {
        "quick" => Some(quick_profile()),
        "standard" => Some(standard_profile()),
        "thorough" => Some(thorough_profile()),
        _ => None,
    }
}

/// Parse a human-readable size string to a usize.
///
/// Supports:
/// - "1M" or "1m" -> 1_000_000
/// - "100K" or "100k" -> 100_000
/// - "1_000_000" -> 1_000_000
/// - "1000000" -> 1_000_000
pub fn parse_size(s: &str) -> std::result::Result<usize, String> {
    let s = s.trim();

    if let Some(prefix) = s.strip_suffix('M').or_else(|| s.strip_suffix('m')) {
        let num: f64 = prefix
            .replace('_', "")
            .parse()
            .map_err(|e| format!("Invalid size '{}': {}", s, e))?;
        return Ok((num * 1_000_000.0) as usize);
    }

    if let Some(prefix) = s.strip_suffix('K').or_else(|| s.strip_suffix('k')) {
        let num: f64 = prefix
            .replace('_', "")
            .parse()
            .map_err(|e| format!("Invalid size '{}': {}", s, e))?;
        return Ok((num * 1_000.0) as usize);
    }

    s.replace('_', "")
        .parse::<usize>()
        .map_err(|e| format!("Invalid size '{}': {}", s, e))
}

/// Parse a list of size strings.
pub fn parse_sizes(raw: &[String]) -> std::result::Result<Vec<usize>, String> {
    raw.iter().map(|s| parse_size(s)).collect()
}

/// Fully resolved benchmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    pub workloads: Vec<Workload>,
    pub sizes: Vec<usize>,
    /// Iteration override; `None` keeps each workload's default.
    pub runs: Option<u32>,
    pub warmup: u32,
    pub seed: u64,
    pub group_size: usize,
    pub chunk_size: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        let profile = standard_profile();
        Self {
            workloads: Workload::ALL.to_vec(),
            sizes: profile.sizes,
            runs: profile.runs,
            warmup: profile.warmup,
            seed: 42,
            group_size: 128,
            chunk_size: 128,
        }
    }
}

impl BenchConfig {
    /// Check the invariants the harness relies on.
    pub fn validate(&self) -> Result<()> {
        if self.workloads.is_empty() {
            return Err(BenchError::Config("no workloads selected".into()));
        }
        if self.sizes.is_empty() {
            return Err(BenchError::Config("no sizes selected".into()));
        }
        if let Some(&bad) = self.sizes.iter().find(|&&n| n == 0 || n >= u32::MAX as usize) {
            return Err(BenchError::Config(format!(
                "size {} must be in 1..{}",
                bad,
                u32::MAX
            )));
        }
        if self.runs == Some(0) {
            return Err(BenchError::Config("runs must be positive".into()));
        }
        if self.group_size == 0 {
            return Err(BenchError::Config("group size must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(BenchError::Config("chunk size must be positive".into()));
        }
        for (name, value) in [("group size", self.group_size), ("chunk size", self.chunk_size)] {
            if value > u32::MAX as usize {
                return Err(BenchError::Config(format!(
                    "{} {} exceeds {}",
                    name,
                    value,
                    u32::MAX
                )));
            }
        }
        Ok(())
    }

    /// Measured iterations for `workload`.
    pub fn iterations_for(&self, workload: Workload) -> u32 {
        self.runs.unwrap_or_else(|| workload.default_iterations())
    }

    /// Device strategies, in reporting order.
    pub fn strategies(&self) -> [ReductionStrategy; 2] {
        [
            ReductionStrategy::Stupid {
                chunk_size: self.chunk_size,
            },
            ReductionStrategy::Smart,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_millions() {
        assert_eq!(parse_size("1M").unwrap(), 1_000_000);
        assert_eq!(parse_size("100M").unwrap(), 100_000_000);
        assert_eq!(parse_size("1m").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_size_thousands() {
        assert_eq!(parse_size("100K").unwrap(), 100_000);
        assert_eq!(parse_size("100k").unwrap(), 100_000);
    }

    #[test]
    fn test_parse_size_raw() {
        assert_eq!(parse_size("1000000").unwrap(), 1_000_000);
        assert_eq!(parse_size("1_000_000").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("abc").is_err());
        assert!(parse_size("").is_err());
    }

    #[test]
    fn test_parse_size_fractional_and_whitespace() {
        assert_eq!(parse_size("0.5M").unwrap(), 500_000);
        assert_eq!(parse_size("1.5K").unwrap(), 1_500);
        assert_eq!(parse_size("  1M  ").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_sizes_with_invalid() {
        let input = vec!["1M".to_string(), "bad".to_string()];
        assert!(parse_sizes(&input).is_err());
    }

    #[test]
    fn test_profiles() {
        assert_eq!(quick_profile().runs, Some(3));
        assert_eq!(standard_profile().sizes, vec![100_000_000]);
        assert_eq!(standard_profile().runs, None);
        assert_eq!(thorough_profile().warmup, 3);
        assert!(get_profile("standard").is_some());
        assert!(get_profile("unknown").is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        let c = BenchConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.seed, 42);
        assert_eq!(c.iterations_for(Workload::Sum), 10);
        assert_eq!(c.iterations_for(Workload::ComplexFunction), 5);
    }

    #[test]
    fn test_runs_override() {
        let c = BenchConfig {
            runs: Some(2),
            ..BenchConfig::default()
        };
        assert_eq!(c.iterations_for(Workload::Sum), 2);
        assert_eq!(c.iterations_for(Workload::ComplexFunction), 2);
    }

    #[test]
    fn test_validate_rejects() {
        let base = BenchConfig::default();
        let cases = [
            BenchConfig { group_size: 0, ..base.clone() },
            BenchConfig { chunk_size: 0, ..base.clone() },
            BenchConfig { runs: Some(0), ..base.clone() },
            BenchConfig { sizes: vec![0], ..base.clone() },
            BenchConfig { sizes: vec![], ..base.clone() },
            BenchConfig { workloads: vec![], ..base.clone() },
            BenchConfig { chunk_size: 1usize << 32, ..base.clone() },
            BenchConfig { group_size: 1usize << 32, ..base.clone() },
        ];
        for c in cases {
            let err = c.validate().unwrap_err();
            assert_eq!(err.code(), 7, "{err}");
        }
    }

    #[test]
    fn test_strategies_order() {
        let c = BenchConfig {
            chunk_size: 64,
            ..BenchConfig::default()
        };
        assert_eq!(
            c.strategies(),
            [ReductionStrategy::Stupid { chunk_size: 64 }, ReductionStrategy::Smart]
        );
    }
}
