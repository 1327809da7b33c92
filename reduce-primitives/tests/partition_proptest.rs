//! Property tests for work partitioning and host dispatch coverage.

use proptest::prelude::*;

use reduce_primitives::{
    round_up, ComputeBackend, DeviceCriteria, HostBackend, HostProgram, KernelSource, WorkGroup,
    WorkPartition,
};

/// Every lane with gid < n increments slot n exactly once.
struct CountLanes;

impl HostProgram for CountLanes {
    fn run_group(&self, group: &mut WorkGroup<'_>) {
        let n = group.scalar(0) as usize;
        for lid in 0..group.group_size() {
            if group.global_id(lid) < n {
                group.atomic_add(n, 1);
            }
        }
    }
}

proptest! {
    #[test]
    fn round_up_is_smallest_multiple(n in 0usize..10_000_000, group in 1usize..2048) {
        let r = round_up(n, group);
        prop_assert_eq!(r % group, 0);
        prop_assert!(r >= n);
        prop_assert!(r < n + group);
    }

    #[test]
    fn covering_partition_is_valid(n in 0usize..1_000_000, group in 1usize..1024) {
        let p = WorkPartition::covering(n, group).unwrap();
        prop_assert!(p.validate().is_ok());
        prop_assert!(p.total_work_items() >= n);
        prop_assert_eq!(p.group_count() * p.group_size(), p.total_work_items());
    }

    #[test]
    fn non_multiples_are_rejected(group in 2usize..1024, extra in 1usize..1024) {
        prop_assume!(extra % group != 0);
        prop_assert!(WorkPartition::new(group, group * 3 + extra).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn host_dispatch_runs_each_lane_once(n in 1usize..50_000, group_pow in 0u32..10) {
        let group = 1usize << group_pow;
        let backend = HostBackend::select(&DeviceCriteria::any()).unwrap();
        let source = KernelSource::new("count", "kernel void count_lanes(device uint* d, constant uint& n) {}")
            .with_host_program("count_lanes", 1, CountLanes);
        let kernel = backend.compile_kernel(&source, "count_lanes").unwrap();
        let buffer = backend.allocate_buffer(n + 1).unwrap();
        backend
            .dispatch(&kernel, &buffer, WorkPartition::covering(n, group).unwrap(), &[n as u32])
            .unwrap();

        let mut out = [0u32; 1];
        backend.download(&buffer, &mut out, n).unwrap();
        prop_assert_eq!(out[0] as usize, n);
    }
}

#[test]
fn atomic_accumulator_never_loses_updates() {
    let n = 10_000usize;
    let backend = HostBackend::select(&DeviceCriteria::any()).unwrap();
    let source = KernelSource::new("count", "kernel void count_lanes(device uint* d, constant uint& n) {}")
        .with_host_program("count_lanes", 1, CountLanes);
    let kernel = backend.compile_kernel(&source, "count_lanes").unwrap();
    let partition = WorkPartition::covering(n, 128).unwrap();

    for _ in 0..50 {
        let buffer = backend.allocate_buffer(n + 1).unwrap();
        backend.dispatch(&kernel, &buffer, partition, &[n as u32]).unwrap();
        let mut out = [0u32; 1];
        backend.download(&buffer, &mut out, n).unwrap();
        assert_eq!(out[0] as usize, n);
    }
}
