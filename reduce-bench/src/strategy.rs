//! Reduction strategies and their host lane programs.
//!
//! Both strategies accumulate into the slot just past the inputs (index `n`)
//! with an atomic add. They differ in how many atomics hit that slot:
//! stupid issues one per chunk-folding lane, smart one per work-group after
//! a local reduction.

use serde::{Deserialize, Serialize};

use reduce_primitives::{div_up, round_up, BackendError, HostProgram, WorkGroup, WorkPartition};

use crate::functions::ElementFunction;
use crate::workloads::Workload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReductionStrategy {
    /// Each lane folds `chunk_size` contiguous elements then adds once.
    Stupid { chunk_size: usize },
    /// One lane per element, group-local reduction, one add per group.
    Smart,
}

impl ReductionStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ReductionStrategy::Stupid { .. } => "GPU (stupid)",
            ReductionStrategy::Smart => "GPU (smart)",
        }
    }

    /// Launch shape covering `n` elements. `n` and the chunk size travel to
    /// the kernel as u32 scalars, so both must fit one.
    pub fn partition(&self, n: usize, group_size: usize) -> Result<WorkPartition, BackendError> {
        self.scalar_args(n)?;
        let lanes = match *self {
            ReductionStrategy::Stupid { chunk_size } => {
                if chunk_size == 0 {
                    return Err(BackendError::Dispatch("chunk size must be positive".into()));
                }
                div_up(n, chunk_size)
            }
            ReductionStrategy::Smart => n,
        };
        if group_size == 0 {
            return Err(BackendError::Dispatch("group size must be positive".into()));
        }
        WorkPartition::new(group_size, round_up(lanes, group_size))
    }

    pub fn entry_point(&self, workload: Workload) -> &'static str {
        match (workload, self) {
            (Workload::Sum, ReductionStrategy::Stupid { .. }) => "sum_stupid",
            (Workload::Sum, ReductionStrategy::Smart) => "sum_smart",
            (Workload::ComplexFunction, ReductionStrategy::Stupid { .. }) => {
                "complex_function_stupid"
            }
            (Workload::ComplexFunction, ReductionStrategy::Smart) => "complex_function_smart",
        }
    }

    /// Scalar kernel arguments after the buffer: `[n, chunk]` or `[n]`.
    pub fn scalar_args(&self, n: usize) -> Result<Vec<u32>, BackendError> {
        let n = scalar_u32("element count", n)?;
        match *self {
            ReductionStrategy::Stupid { chunk_size } => {
                Ok(vec![n, scalar_u32("chunk size", chunk_size)?])
            }
            ReductionStrategy::Smart => Ok(vec![n]),
        }
    }
}

fn scalar_u32(what: &str, value: usize) -> Result<u32, BackendError> {
    u32::try_from(value).map_err(|_| {
        BackendError::Dispatch(format!(
            "{} {} does not fit a u32 kernel argument",
            what, value
        ))
    })
}

/// Host lanes for the `*_stupid` kernels.
pub struct StupidReduction {
    pub function: ElementFunction,
}

impl HostProgram for StupidReduction {
    fn run_group(&self, group: &mut WorkGroup<'_>) {
        let n = group.scalar(0) as usize;
        let chunk = group.scalar(1) as usize;
        for lid in 0..group.group_size() {
            let start = group.global_id(lid).saturating_mul(chunk);
            if start >= n {
                continue;
            }
            let end = start.saturating_add(chunk).min(n);
            let acc = (start..end).fold(0u32, |acc, i| {
                acc.wrapping_add(self.function.apply(group.load(i)))
            });
            group.atomic_add(n, acc);
        }
    }
}

/// Host lanes for the `*_smart` kernels.
pub struct SmartReduction {
    pub function: ElementFunction,
}

impl HostProgram for SmartReduction {
    fn run_group(&self, group: &mut WorkGroup<'_>) {
        let n = group.scalar(0) as usize;
        let size = group.group_size();
        let base = group.global_id(0);

        for lid in 0..size {
            let gid = base + lid;
            let value = if gid < n {
                self.function.apply(group.load(gid))
            } else {
                0
            };
            group.local_mut()[lid] = value;
        }

        // barrier
        let local = group.local_mut();
        if size.is_power_of_two() {
            let mut stride = size / 2;
            while stride > 0 {
                for lid in 0..stride {
                    local[lid] = local[lid].wrapping_add(local[lid + stride]);
                }
                stride /= 2;
            }
        } else {
            local[0] = local[1..]
                .iter()
                .fold(local[0], |acc, &v| acc.wrapping_add(v));
        }

        let total = local[0];
        group.atomic_add(n, total);
    }
}
