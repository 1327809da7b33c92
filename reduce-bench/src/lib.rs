//! Benchmark and consistency harness for u32 reductions.
//!
//! Every workload runs as four configurations on the same input: a serial
//! CPU fold (the reference), a rayon CPU reduction, and two device
//! strategies. The device "stupid" strategy has each lane fold a chunk and
//! atomically add it; the "smart" strategy reduces inside each work-group
//! first. The first result of every configuration must equal the reference.

pub mod cli;
pub mod config;
pub mod cpu_baselines;
pub mod data_gen;
pub mod error;
pub mod functions;
pub mod harness;
pub mod kernels;
pub mod logging;
pub mod output;
pub mod reference;
pub mod stats;
pub mod strategy;
pub mod workloads;

pub use error::{BenchError, Result};
pub use functions::ElementFunction;
pub use harness::{Harness, Measurement, Session, WorkloadRun};
pub use reference::compute_reference;
pub use strategy::ReductionStrategy;
pub use workloads::Workload;
