//! Measurement harness: runs each configuration through warmup + measured
//! loops, checks the first result against the reference, and returns
//! structured measurements.

use std::panic::Location;

use serde::{Deserialize, Serialize};

use reduce_primitives::{time_secs, ComputeBackend, KernelSource, WorkPartition};

use crate::config::BenchConfig;
use crate::cpu_baselines::rayon_reduce::par_sum_u32;
use crate::data_gen::DataGenerator;
use crate::error::{BenchError, Result, StepExt};
use crate::functions::ElementFunction;
use crate::reference::compute_reference;
use crate::stats::{compute_stats, Stats};
use crate::strategy::ReductionStrategy;
use crate::workloads::Workload;

/// One way of computing the reduction, driven by the harness.
pub trait Execution {
    /// Untimed preparation before every iteration.
    fn reset(&mut self) -> Result<()>;

    /// The timed work. Must not return before the result is final.
    fn execute_once(&mut self) -> Result<()>;

    /// Scalar produced by the last `execute_once`.
    fn result(&mut self) -> Result<u32>;
}

/// Serial or rayon reduction on the host.
pub struct CpuExecution<'a> {
    input: &'a [u32],
    function: ElementFunction,
    parallel: bool,
    last: u32,
}

impl<'a> CpuExecution<'a> {
    pub fn serial(input: &'a [u32], function: ElementFunction) -> Self {
        Self {
            input,
            function,
            parallel: false,
            last: 0,
        }
    }

    pub fn parallel(input: &'a [u32], function: ElementFunction) -> Self {
        Self {
            parallel: true,
            ..Self::serial(input, function)
        }
    }
}

impl Execution for CpuExecution<'_> {
    fn reset(&mut self) -> Result<()> {
        self.last = 0;
        Ok(())
    }

    fn execute_once(&mut self) -> Result<()> {
        self.last = if self.parallel {
            par_sum_u32(self.input, self.function)
        } else {
            compute_reference(self.input, self.function)
        };
        Ok(())
    }

    fn result(&mut self) -> Result<u32> {
        Ok(std::hint::black_box(self.last))
    }
}

/// A compiled kernel plus the device buffer it reduces.
///
/// The buffer holds the `n` inputs followed by the accumulator slot.
pub struct DeviceExecution<'a, B: ComputeBackend> {
    backend: &'a B,
    kernel: B::Kernel,
    buffer: B::Buffer,
    partition: WorkPartition,
    scalars: Vec<u32>,
    n: usize,
}

impl<'a, B: ComputeBackend> DeviceExecution<'a, B> {
    /// Compile `entry_point`, allocate `input.len() + 1` elements and upload
    /// the input.
    pub fn new(
        backend: &'a B,
        source: &KernelSource,
        entry_point: &str,
        partition: WorkPartition,
        scalars: Vec<u32>,
        input: &[u32],
    ) -> Result<Self> {
        let kernel = backend.compile_kernel(source, entry_point).step("compile kernel")?;
        let n = input.len();
        let buffer = backend.allocate_buffer(n + 1).step("allocate buffer")?;
        backend.upload(&buffer, input, 0).step("upload input")?;
        tracing::debug!(
            entry_point,
            n,
            groups = partition.group_count(),
            group_size = partition.group_size(),
            "device configuration ready"
        );
        Ok(Self {
            backend,
            kernel,
            buffer,
            partition,
            scalars,
            n,
        })
    }

    /// Prepare `strategy` for `workload` over `input`.
    pub fn for_strategy(
        backend: &'a B,
        source: &KernelSource,
        strategy: ReductionStrategy,
        workload: Workload,
        input: &[u32],
        group_size: usize,
    ) -> Result<Self> {
        let partition = strategy
            .partition(input.len(), group_size)
            .step("partition work")?;
        let scalars = strategy.scalar_args(input.len()).step("partition work")?;
        Self::new(
            backend,
            source,
            strategy.entry_point(workload),
            partition,
            scalars,
            input,
        )
    }
}

impl<B: ComputeBackend> Execution for DeviceExecution<'_, B> {
    fn reset(&mut self) -> Result<()> {
        self.backend
            .upload(&self.buffer, &[0], self.n)
            .step("reset accumulator")
    }

    fn execute_once(&mut self) -> Result<()> {
        self.backend
            .dispatch(&self.kernel, &self.buffer, self.partition, &self.scalars)
            .step("dispatch")
    }

    fn result(&mut self) -> Result<u32> {
        let mut out = [0u32; 1];
        self.backend
            .download(&self.buffer, &mut out, self.n)
            .step("download result")?;
        Ok(out[0])
    }
}

/// Fail with [`BenchError::Consistency`] unless `actual == expected`.
#[track_caller]
pub fn assert_equal(actual: u32, expected: u32, context: &str) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(BenchError::Consistency {
            context: context.to_string(),
            expected,
            actual,
            location: Location::caller(),
        })
    }
}

/// Timing results for one configuration of one workload at one size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub workload: Workload,
    pub size: usize,
    pub iterations: u32,
    pub ops_per_element: u32,
    pub stats: Stats,
}

impl Measurement {
    /// Elements reduced per second, in millions.
    pub fn millions_per_sec(&self) -> f64 {
        if self.stats.mean > 0.0 {
            self.size as f64 / 1e6 / self.stats.mean
        } else {
            0.0
        }
    }

    /// Billions of element operations per second.
    pub fn gflops(&self) -> f64 {
        if self.stats.mean > 0.0 {
            self.ops_per_element as f64 * self.size as f64 / 1e9 / self.stats.mean
        } else {
            0.0
        }
    }
}

/// Runs configurations that share one input and one reference result.
pub struct Harness<'a> {
    workload: Workload,
    size: usize,
    reference: u32,
    warmup: u32,
    progress_cb: Option<&'a dyn Fn(&str)>,
}

impl<'a> Harness<'a> {
    pub fn new(workload: Workload, size: usize, reference: u32) -> Self {
        Self {
            workload,
            size,
            reference,
            warmup: 0,
            progress_cb: None,
        }
    }

    pub fn with_warmup(mut self, warmup: u32) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_progress(mut self, cb: Option<&'a dyn Fn(&str)>) -> Self {
        self.progress_cb = cb;
        self
    }

    fn report(&self, msg: String) {
        if let Some(cb) = self.progress_cb {
            cb(&msg);
        }
    }

    /// Run `exec` for `warmup + iterations` iterations.
    ///
    /// 1. reset (untimed)
    /// 2. execute_once (timed)
    /// 3. on the very first iteration only, check the result
    ///
    /// Warmup timings are discarded.
    pub fn run_configuration(
        &self,
        name: &str,
        exec: &mut dyn Execution,
        iterations: u32,
    ) -> Result<Measurement> {
        let label = format!("{} @ {}: {}", self.workload, format_size(self.size), name);
        tracing::info!(configuration = name, workload = %self.workload, size = self.size, iterations, "measuring");

        let total = self.warmup + iterations;
        let mut samples = Vec::with_capacity(iterations as usize);
        for i in 0..total {
            if i < self.warmup {
                self.report(format!("{label}: warmup {}/{}", i + 1, self.warmup));
            } else {
                self.report(format!("{label}: run {}/{}", i - self.warmup + 1, iterations));
            }

            exec.reset()?;
            let (outcome, elapsed) = time_secs(|| exec.execute_once());
            outcome?;

            if i == 0 {
                let actual = exec.result()?;
                assert_equal(actual, self.reference, name)?;
                tracing::debug!(configuration = name, result = actual, "result matches reference");
            }
            if i >= self.warmup {
                samples.push(elapsed);
            }
        }

        Ok(Measurement {
            name: name.to_string(),
            workload: self.workload,
            size: self.size,
            iterations,
            ops_per_element: self.workload.ops_per_element(),
            stats: compute_stats(&samples),
        })
    }
}

/// A configuration that was aborted by a backend error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFailure {
    pub name: String,
    pub workload: Workload,
    pub size: usize,
    pub step: String,
    pub code: i32,
    pub diagnostic: String,
}

/// Everything measured for one workload at one size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadRun {
    pub workload: Workload,
    pub size: usize,
    pub reference: u32,
    pub measurements: Vec<Measurement>,
    pub failures: Vec<ConfigFailure>,
}

/// Prepare and measure one device strategy.
pub fn run_device_configuration<B: ComputeBackend>(
    backend: &B,
    harness: &Harness<'_>,
    source: &KernelSource,
    strategy: ReductionStrategy,
    input: &[u32],
    group_size: usize,
    iterations: u32,
) -> Result<Measurement> {
    let mut exec = DeviceExecution::for_strategy(
        backend,
        source,
        strategy,
        harness.workload,
        input,
        group_size,
    )?;
    harness.run_configuration(strategy.label(), &mut exec, iterations)
}

/// Runs every configuration of every workload against one backend.
pub struct Session<'a, B: ComputeBackend> {
    backend: &'a B,
    config: &'a BenchConfig,
    progress_cb: Option<&'a dyn Fn(&str)>,
}

impl<'a, B: ComputeBackend> Session<'a, B> {
    pub fn new(backend: &'a B, config: &'a BenchConfig) -> Self {
        Self {
            backend,
            config,
            progress_cb: None,
        }
    }

    pub fn with_progress(mut self, cb: &'a dyn Fn(&str)) -> Self {
        self.progress_cb = Some(cb);
        self
    }

    /// Run `workload` at `size` in order: CPU, CPU parallel, then each
    /// device strategy.
    ///
    /// Each completed measurement is passed to `sink` as soon as it exists.
    /// Backend errors are recorded as failures and the remaining
    /// configurations still run; a consistency error is returned at once.
    pub fn run_workload(
        &self,
        workload: Workload,
        size: usize,
        gen: &mut DataGenerator,
        sink: &mut dyn FnMut(&Measurement),
    ) -> Result<WorkloadRun> {
        let function = workload.function();
        let input = workload.generate_input(size, gen);
        let reference = compute_reference(&input, function);
        tracing::info!(%workload, size, reference, "reference computed");

        let harness = Harness::new(workload, size, reference)
            .with_warmup(self.config.warmup)
            .with_progress(self.progress_cb);
        let iterations = self.config.iterations_for(workload);

        let mut run = WorkloadRun {
            workload,
            size,
            reference,
            measurements: Vec::new(),
            failures: Vec::new(),
        };

        let cpu = harness.run_configuration(
            "CPU",
            &mut CpuExecution::serial(&input, function),
            iterations,
        )?;
        sink(&cpu);
        run.measurements.push(cpu);

        let parallel = harness.run_configuration(
            "CPU parallel",
            &mut CpuExecution::parallel(&input, function),
            iterations,
        )?;
        sink(&parallel);
        run.measurements.push(parallel);

        let source = workload.kernel_source();
        for strategy in self.config.strategies() {
            let result = run_device_configuration(
                self.backend,
                &harness,
                &source,
                strategy,
                &input,
                self.config.group_size,
                iterations,
            );
            match result {
                Ok(m) => {
                    sink(&m);
                    run.measurements.push(m);
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(configuration = strategy.label(), "{}", e.diagnostic());
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(configuration = strategy.label(), "{}", e.diagnostic());
                    run.failures.push(ConfigFailure {
                        name: strategy.label().to_string(),
                        workload,
                        size,
                        step: e.step().to_string(),
                        code: e.code(),
                        diagnostic: e.diagnostic(),
                    });
                }
            }
        }

        Ok(run)
    }

    /// Every configured workload at every configured size, sharing one
    /// seeded generator.
    pub fn run_all(&self, sink: &mut dyn FnMut(&Measurement)) -> Result<Vec<WorkloadRun>> {
        let mut gen = DataGenerator::new(self.config.seed);
        let mut runs = Vec::new();
        for &workload in &self.config.workloads {
            for &size in &self.config.sizes {
                runs.push(self.run_workload(workload, size, &mut gen, sink)?);
            }
        }
        Ok(runs)
    }
}

/// Format a size number for display (e.g., 1000000 -> "1M").
pub fn format_size(size: usize) -> String {
    if size >= 1_000_000 && size.is_multiple_of(1_000_000) {
        format!("{}M", size / 1_000_000)
    } else if size >= 1_000 && size.is_multiple_of(1_000) {
        format!("{}K", size / 1_000)
    } else {
        format!("{}", size)
    }
}
