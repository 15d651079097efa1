//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - ensures the correction grid is available
//! - runs the supervised sweep
//! - prints the run summary
//! - writes the result tables

use clap::Parser;

use crate::cli::{Command, FetchGridArgs, RunArgs};
use crate::domain::SweepConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `xrbsweep` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::FetchGrid(args) => handle_fetch_grid(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = sweep_config_from_args(&args);
    let run = pipeline::run_sweep(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &run.report,
            run.summaries.len(),
            run.elapsed,
            &run.full_csv,
            &run.reduced_csv,
        )
    );

    // DONE and HALTED both exit normally; the distinction lives in the
    // summary text, the counts, and the persistent error log.
    Ok(())
}

fn handle_fetch_grid(args: FetchGridArgs) -> Result<(), AppError> {
    if args.force || !args.grid_file.is_file() {
        let url = crate::grid::fetch::grid_url();
        crate::grid::fetch::fetch_grid(&url, &args.grid_file)?;
    }
    let grid = crate::grid::Grid::load(&args.grid_file)?;
    println!(
        "Grid cached at '{}' ({} spin x {} inclination entries).",
        args.grid_file.display(),
        grid.a_grid.len(),
        grid.i_grid.len()
    );
    Ok(())
}

pub fn sweep_config_from_args(args: &RunArgs) -> SweepConfig {
    SweepConfig {
        gamma: args.gamma,
        temp: args.temp,
        spin: args.spin,
        mass: args.mass,
        inc: args.inc,
        ratio_disk_to_tot: args.ratio_disk_to_tot,
        exposure: args.exposure,
        band_low_kev: args.band_low_kev,
        band_high_kev: args.band_high_kev,
        channels: args.channels,
        back_exposure: args.back_exposure,
        counting_stats: !args.no_counting_stats,
        nh_values: args.nh_values.clone(),
        d_values: args.d_values.clone(),
        iterations: args.iterations,
        workers: args.workers,
        task_deadline_secs: args.task_deadline_secs,
        max_consecutive_timeouts: args.max_consecutive_timeouts,
        limb_darkening: !args.no_limb_darkening,
        seed: args.seed,
        grid_path: args.grid_file.clone(),
        scratch_dir: args.scratch_dir.clone(),
        results_dir: args.results_dir.clone(),
        error_log: args.error_log.clone(),
    }
}
