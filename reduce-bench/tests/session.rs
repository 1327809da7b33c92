//! Whole-session behaviour on the host backend.

mod common;

use common::host;
use reduce_bench::config::BenchConfig;
use reduce_bench::data_gen::DataGenerator;
use reduce_bench::harness::Measurement;
use reduce_bench::{Session, Workload};

fn small_config() -> BenchConfig {
    BenchConfig {
        workloads: Workload::ALL.to_vec(),
        sizes: vec![10_000],
        runs: Some(2),
        warmup: 1,
        seed: 42,
        group_size: 128,
        chunk_size: 64,
    }
}

#[test]
fn configurations_run_in_order() {
    let backend = host();
    let config = small_config();
    let mut seen = Vec::new();
    let runs = Session::new(&backend, &config)
        .run_all(&mut |m: &Measurement| seen.push((m.workload, m.name.clone())))
        .unwrap();

    assert_eq!(runs.len(), 2);
    let names: Vec<&str> = runs[0].measurements.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["CPU", "CPU parallel", "GPU (stupid)", "GPU (smart)"]);
    assert!(runs.iter().all(|r| r.failures.is_empty()));
    assert_eq!(seen.len(), 8);
    assert_eq!(seen[0], (Workload::Sum, "CPU".to_string()));
    assert_eq!(seen[7], (Workload::ComplexFunction, "GPU (smart)".to_string()));
    assert_eq!(runs[1].reference, 10_000);
    for m in runs.iter().flat_map(|r| &r.measurements) {
        assert_eq!(m.stats.sample_count, 2);
        assert!(m.stats.mean.is_finite() && m.stats.mean >= 0.0);
    }
}

#[test]
fn same_seed_gives_same_reference() {
    let backend = host();
    let config = small_config();
    let session = Session::new(&backend, &config);
    let mut ignore = |_: &Measurement| {};
    let a = session
        .run_workload(Workload::Sum, 10_000, &mut DataGenerator::new(42), &mut ignore)
        .unwrap();
    let b = session
        .run_workload(Workload::Sum, 10_000, &mut DataGenerator::new(42), &mut ignore)
        .unwrap();
    assert_eq!(a.reference, b.reference);
    assert_ne!(a.reference, 0);
}

#[test]
fn backend_failure_keeps_sibling_configurations() {
    let backend = host();
    let config = BenchConfig {
        workloads: vec![Workload::Sum],
        group_size: 2048,
        ..small_config()
    };
    let runs = Session::new(&backend, &config)
        .run_all(&mut |_: &Measurement| {})
        .unwrap();
    let run = &runs[0];
    let names: Vec<&str> = run.measurements.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["CPU", "CPU parallel"]);
    assert_eq!(run.failures.len(), 2);
    assert!(run.failures.iter().all(|f| f.code == 5 && f.step == "dispatch"));
    assert!(run.failures[0].diagnostic.starts_with("error[E0005] dispatch:"));
}
