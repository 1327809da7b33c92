use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use reduce_primitives::{DeviceCriteria, DeviceKind};

use crate::config::{get_profile, parse_sizes, BenchConfig};
use crate::error::{BenchError, Result};
use crate::workloads::Workload;

/// Which compute backend runs the device strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Host-emulated accelerator on the rayon pool
    Host,
    /// Apple GPU through Metal (macOS only)
    Metal,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            BackendKind::Metal
        } else {
            BackendKind::Host
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceType {
    Gpu,
    Cpu,
    Any,
}

/// Data-parallel u32 reduction benchmark: CPU vs. stupid vs. smart device strategies
#[derive(Parser, Debug)]
#[command(name = "reduce-bench", version, about)]
pub struct BenchArgs {
    /// Workloads to run: sum, complex, or all
    #[arg(value_name = "WORKLOADS")]
    pub workloads: Vec<String>,

    /// Element counts to benchmark (e.g., 1M, 100K, 1000000)
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<String>>,

    /// Measured iterations per configuration (default: 10 for sum, 5 for complex)
    #[arg(long)]
    pub runs: Option<u32>,

    /// Untimed warmup iterations before measurement
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Benchmark profile: quick (1M/3/0), standard (100M/default/0), thorough (1M+10M+100M/30/3)
    #[arg(long)]
    pub profile: Option<String>,

    /// Seed for input generation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Lanes per work-group
    #[arg(long, default_value_t = 128)]
    pub group_size: usize,

    /// Elements folded by each lane of the stupid strategy
    #[arg(long, default_value_t = 128)]
    pub chunk_size: usize,

    /// Compute backend for the device strategies
    #[arg(long, value_enum, default_value_t = BackendKind::default())]
    pub backend: BackendKind,

    /// Device index, as printed by --list-devices
    #[arg(long)]
    pub device: Option<usize>,

    /// Kind of device to select
    #[arg(long, value_enum, default_value_t = DeviceType::Any)]
    pub device_type: DeviceType,

    /// List the backend's devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Write JSON results to file
    #[arg(long)]
    pub json_file: Option<PathBuf>,

    /// Write CSV results to file
    #[arg(long)]
    pub csv_file: Option<PathBuf>,

    /// Hide the progress spinner
    #[arg(long, short)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl BenchArgs {
    /// Device selection from `--device` / `--device-type`.
    pub fn device_criteria(&self) -> DeviceCriteria {
        let mut criteria = DeviceCriteria::any();
        if let Some(index) = self.device {
            criteria = criteria.with_index(index);
        }
        match self.device_type {
            DeviceType::Gpu => criteria.with_kind(DeviceKind::Gpu),
            DeviceType::Cpu => criteria.with_kind(DeviceKind::Cpu),
            DeviceType::Any => criteria,
        }
    }

    fn selected_workloads(&self) -> Result<Vec<Workload>> {
        if self.workloads.is_empty() || self.workloads.iter().any(|w| w.eq_ignore_ascii_case("all")) {
            return Ok(Workload::ALL.to_vec());
        }
        let mut selected = Vec::new();
        for name in &self.workloads {
            let w = Workload::from_name(name).ok_or_else(|| {
                BenchError::Config(format!(
                    "unknown workload '{}'. Available: sum, complex, all",
                    name
                ))
            })?;
            if !selected.contains(&w) {
                selected.push(w);
            }
        }
        Ok(selected)
    }

    /// Resolve sizes, iterations and warmup: explicit flags win over the
    /// profile, the profile over the defaults.
    pub fn to_config(&self) -> Result<BenchConfig> {
        let defaults = BenchConfig::default();
        let profile = match &self.profile {
            Some(name) => Some(get_profile(name).ok_or_else(|| {
                BenchError::Config(format!(
                    "unknown profile '{}'. Valid: quick, standard, thorough",
                    name
                ))
            })?),
            None => None,
        };

        let sizes = match (&self.sizes, &profile) {
            (Some(raw), _) => parse_sizes(raw).map_err(BenchError::Config)?,
            (None, Some(p)) => p.sizes.clone(),
            (None, None) => defaults.sizes.clone(),
        };
        let runs = self
            .runs
            .or_else(|| profile.as_ref().and_then(|p| p.runs))
            .or(defaults.runs);
        let warmup = self
            .warmup
            .or_else(|| profile.as_ref().map(|p| p.warmup))
            .unwrap_or(defaults.warmup);

        let config = BenchConfig {
            workloads: self.selected_workloads()?,
            sizes,
            runs,
            warmup,
            seed: self.seed,
            group_size: self.group_size,
            chunk_size: self.chunk_size,
        };
        config.validate()?;
        Ok(config)
    }
}
