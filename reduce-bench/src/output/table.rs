//! Table output using comfy-table.
//!
//! One table per workload and size with columns:
//! Configuration | Mean (ms) | Std (ms) | M elem/s | GFlops | CV% | vs CPU

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::harness::{format_size, WorkloadRun};

/// Build the table for one workload run.
pub fn build_table(run: &WorkloadRun) -> Table {
    let cpu_mean = run
        .measurements
        .iter()
        .find(|m| m.name == "CPU")
        .map(|m| m.stats.mean);

    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Configuration").add_attribute(Attribute::Bold),
            Cell::new("Mean (ms)").add_attribute(Attribute::Bold),
            Cell::new("Std (ms)").add_attribute(Attribute::Bold),
            Cell::new("M elem/s").add_attribute(Attribute::Bold),
            Cell::new("GFlops").add_attribute(Attribute::Bold),
            Cell::new("CV%").add_attribute(Attribute::Bold),
            Cell::new("vs CPU").add_attribute(Attribute::Bold),
        ]);

    for m in &run.measurements {
        let speedup = match cpu_mean {
            Some(cpu) if m.stats.mean > 0.0 => cpu / m.stats.mean,
            _ => 0.0,
        };
        let speedup_str = format!("{:.1}x", speedup);
        let speedup_cell = if speedup >= 5.0 {
            Cell::new(&speedup_str).fg(Color::Green)
        } else if speedup >= 2.0 {
            Cell::new(&speedup_str).fg(Color::Cyan)
        } else if speedup >= 1.0 {
            Cell::new(&speedup_str).fg(Color::Yellow)
        } else {
            Cell::new(&speedup_str).fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(&m.name),
            Cell::new(format!("{:.3}", m.stats.mean * 1e3)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.stats.stddev * 1e3)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", m.millions_per_sec())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.gflops())).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}", m.stats.cv_percent)).set_alignment(CellAlignment::Right),
            speedup_cell.set_alignment(CellAlignment::Right),
        ]);
    }

    for f in &run.failures {
        table.add_row(vec![
            Cell::new(&f.name),
            Cell::new(format!("FAILED: {} (E{:04})", f.step, f.code)).fg(Color::Red),
        ]);
    }

    table
}

/// Render one table per workload run.
pub fn render_all_tables(runs: &[WorkloadRun]) {
    if runs.is_empty() {
        println!("No results to display.");
        return;
    }

    for run in runs {
        println!(
            "\n=== {} @ {} (reference {}) ===",
            run.workload,
            format_size(run.size),
            run.reference
        );
        println!("{}", build_table(run));
    }
}
