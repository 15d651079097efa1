//! The full sweep pipeline.
//!
//! One place owns the workflow so the CLI can focus on presentation:
//! grid load/fetch -> task generation -> supervised execution ->
//! aggregation -> CSV export.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;

use crate::domain::{GroupSummary, SweepConfig, Task};
use crate::error::AppError;
use crate::grid::fetch::ensure_grid;
use crate::io::{ErrorLog, export};
use crate::sim::spectrum::reclaim_scratch;
use crate::sim::{TrialContext, run_trial};
use crate::sweep::{RunReport, Supervisor, SupervisorConfig, TrialFn, aggregate, generate};

/// All computed outputs of one sweep run.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    pub summaries: Vec<GroupSummary>,
    pub full_csv: PathBuf,
    pub reduced_csv: PathBuf,
    pub elapsed: Duration,
}

/// Execute the configured sweep end to end and write both result tables.
///
/// Returns `Ok` for DONE, HALTED, and STALLED runs alike: all three write
/// whatever outputs are derivable from the outcomes collected so far, and
/// the distinction is visible in the report and the persistent error log.
pub fn run_sweep(config: &SweepConfig) -> Result<RunOutput, AppError> {
    let started = Instant::now();

    let grid = ensure_grid(&config.grid_path)?;
    let ctx = Arc::new(TrialContext::from_config(config, grid)?);
    let tasks = generate(&config.nh_values, &config.d_values, config.iterations)?;

    let supervisor_config = SupervisorConfig {
        workers: config.workers.unwrap_or_else(SupervisorConfig::default_workers),
        task_deadline: Duration::from_secs(config.task_deadline_secs),
        max_consecutive_timeouts: config.max_consecutive_timeouts,
    };
    let error_log = ErrorLog::new(&config.error_log);

    let trial_ctx = Arc::clone(&ctx);
    let trial: Arc<TrialFn> =
        Arc::new(move |task: &Task, generation: u64| run_trial(&trial_ctx, task, generation));

    let scratch_dir = ctx.scratch_dir.clone();
    let mut supervisor = Supervisor::new(supervisor_config, trial, error_log).with_reclaimer(
        move |dead_before| {
            let removed = reclaim_scratch(&scratch_dir, dead_before);
            if removed > 0 {
                eprintln!("Reclaimed {removed} scratch files from terminated pools.");
            }
        },
    );

    // The bar advances for every attempted task, success or not, so a run
    // with failing tasks still visibly makes progress.
    let progress = ProgressBar::new(tasks.len() as u64);
    let report = supervisor.run(&tasks, |_| progress.inc(1));
    progress.finish_and_clear();

    // Every generation is dead once the supervisor returns; sweep whatever
    // abandoned attempts left behind.
    reclaim_scratch(&ctx.scratch_dir, u64::MAX);

    let summaries = aggregate(&report.outcomes, &config.nh_values, &config.d_values);

    let (full_csv, reduced_csv) = export::output_paths(config);
    let successes: Vec<_> = report.successes().collect();
    export::write_full_csv(&full_csv, &successes)?;
    export::write_reduced_csv(&reduced_csv, &summaries)?;

    Ok(RunOutput {
        report,
        summaries,
        full_csv,
        reduced_csv,
        elapsed: started.elapsed(),
    })
}
