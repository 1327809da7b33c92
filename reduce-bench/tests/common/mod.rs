//! Shared helpers for the reduce-bench integration tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use reduce_bench::harness::{run_device_configuration, Harness, Measurement};
use reduce_bench::{compute_reference, ReductionStrategy, Workload};
use reduce_primitives::{ComputeBackend, DeviceCriteria, HostBackend};

pub fn host() -> HostBackend {
    HostBackend::select(&DeviceCriteria::any()).expect("host backend is always available")
}

/// `n` values in `[0, upper]` from a fixed-seed ChaCha stream.
pub fn seeded_input(seed: u64, n: usize, upper: u32) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..=upper)).collect()
}

/// Run `strategy` once over `input` on the host backend.
pub fn run_strategy(
    workload: Workload,
    strategy: ReductionStrategy,
    input: &[u32],
    group_size: usize,
    iterations: u32,
) -> reduce_bench::Result<Measurement> {
    let backend = host();
    let reference = compute_reference(input, workload.function());
    let harness = Harness::new(workload, input.len(), reference);
    run_device_configuration(
        &backend,
        &harness,
        &workload.kernel_source(),
        strategy,
        input,
        group_size,
        iterations,
    )
}

pub const STRATEGIES: [ReductionStrategy; 2] = [
    ReductionStrategy::Stupid { chunk_size: 128 },
    ReductionStrategy::Smart,
];
