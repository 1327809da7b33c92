use clap::Parser;

use reduce_bench::cli::{BackendKind, BenchArgs};
use reduce_bench::error::{Result, StepExt};
use reduce_bench::harness::{Measurement, Session, WorkloadRun};
use reduce_bench::logging::init_tracing;
use reduce_bench::output::progress::BenchProgress;
use reduce_bench::output::report::{print_measurement, workload_header};
use reduce_bench::output::summary::print_summary;
use reduce_bench::output::table::render_all_tables;
use reduce_bench::output::{csv, json};
use reduce_bench::Workload;
use reduce_primitives::{BackendError, ComputeBackend, HostBackend};

fn main() {
    let args = BenchArgs::parse();
    init_tracing(args.verbose);

    let code = match run(&args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(code = e.code(), "aborting session");
            eprintln!("{}", e.diagnostic());
            e.code()
        }
    };
    std::process::exit(code);
}

fn run(args: &BenchArgs) -> Result<i32> {
    match args.backend {
        BackendKind::Host => run_with::<HostBackend>(args),
        #[cfg(target_os = "macos")]
        BackendKind::Metal => run_with::<reduce_primitives::MetalBackend>(args),
        #[cfg(not(target_os = "macos"))]
        BackendKind::Metal => {
            Err(BackendError::BackendInit("Metal is only available on macOS".into()))
                .step("select device")
        }
    }
}

fn list_devices<B: ComputeBackend>() -> Result<()> {
    let devices = B::devices().step("list devices")?;
    if devices.is_empty() {
        return Err(BackendError::NoDeviceFound {
            criteria: "any device".into(),
        })
        .step("list devices");
    }
    for d in devices {
        println!(
            "#{} {} [{}] max group {}, max buffer {} elements",
            d.index, d.name, d.kind, d.max_group_size, d.max_buffer_elements
        );
    }
    Ok(())
}

fn run_with<B: ComputeBackend>(args: &BenchArgs) -> Result<i32> {
    if args.list_devices {
        list_devices::<B>()?;
        return Ok(0);
    }

    let config = args.to_config()?;
    let backend = B::select(&args.device_criteria()).step("select device")?;
    let device = backend.device();

    println!("reduce-bench: u32 reduction benchmark");
    println!(
        "  Device: {} [{} backend, {}]",
        device.name,
        backend.backend_name(),
        device.kind
    );
    println!(
        "  Workloads: {}",
        config
            .workloads
            .iter()
            .map(|w| w.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Sizes: {:?}", config.sizes);
    println!(
        "  Group size: {}, chunk size: {}, warmup: {}, seed: {}",
        config.group_size, config.chunk_size, config.warmup, config.seed
    );
    if let Some(ref path) = args.json_file {
        println!("  JSON output: {}", path.display());
    }
    if let Some(ref path) = args.csv_file {
        println!("  CSV output: {}", path.display());
    }

    let progress = if args.quiet {
        BenchProgress::hidden()
    } else {
        BenchProgress::new()
    };
    let cb = progress.callback();
    let session = Session::new(&backend, &config).with_progress(&cb);

    let mut current: Option<(Workload, usize)> = None;
    let mut sink = |m: &Measurement| {
        progress.suspend(|| {
            if current != Some((m.workload, m.size)) {
                current = Some((m.workload, m.size));
                println!();
                println!(
                    "{}",
                    workload_header(m.workload, m.size, config.iterations_for(m.workload))
                );
            }
            print_measurement(m);
        })
    };
    let result = session.run_all(&mut sink);
    progress.finish();
    let runs: Vec<WorkloadRun> = result?;

    render_all_tables(&runs);
    print_summary(&runs);

    if let Some(ref path) = args.json_file {
        json::write_json(path, backend.backend_name(), device, &config, &runs)?;
        println!("JSON results written to: {}", path.display());
    }
    if let Some(ref path) = args.csv_file {
        csv::write_csv(path, &runs)?;
        println!("CSV results written to: {}", path.display());
    }

    let failures: Vec<_> = runs.iter().flat_map(|r| &r.failures).collect();
    for f in &failures {
        eprintln!("{}", f.diagnostic);
    }
    Ok(failures.first().map_or(0, |f| f.code))
}
