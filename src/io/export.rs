//! Export sweep results to CSV.
//!
//! Two artifacts per run, written once at run end: the "full" table (one
//! row per successfully completed task) and the "reduced" table (one row
//! per group). Paths derive deterministically from the run's physical
//! parameters, so re-running the same sweep overwrites the same files and
//! downstream notebooks can reconstruct the name from the submission.
//!
//! Absent fields export as empty cells, never as zeros: downstream
//! analysis must be able to tell "fit failed" from "fit said zero".

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{GroupSummary, ResultRecord, SweepConfig};
use crate::error::AppError;

/// `(full, reduced)` output paths for this configuration.
pub fn output_paths(config: &SweepConfig) -> (PathBuf, PathBuf) {
    let stem = format!(
        "table_g{}_T{}_a{}_m{}_i{}_r{}_e{}",
        config.gamma,
        config.temp,
        config.spin,
        config.mass,
        config.inc,
        config.ratio_disk_to_tot,
        config.exposure
    );
    (
        config.results_dir.join(format!("{stem}_full.csv")),
        config.results_dir.join(format!("{stem}_red.csv")),
    )
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.10}")).unwrap_or_default()
}

fn create(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::io(format!("Failed to create results directory '{}'", parent.display()), e)
            })?;
        }
    }
    File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create CSV '{}'", path.display()), e))
}

/// One row per successful task, in outcome (= submission) order.
pub fn write_full_csv(path: &Path, records: &[&ResultRecord]) -> Result<(), AppError> {
    let mut file = create(path)?;
    let write_err =
        |e: std::io::Error| AppError::io(format!("Failed to write CSV '{}'", path.display()), e);

    writeln!(
        file,
        "nH,d,red_chi_squared,gamma,power_norm_fake,power_norm_fit,temp,disk_norm_fake,\
         disk_norm_fit,error_disk_norm_low,error_disk_norm_up,d_fit,error_d_low,error_d_up,frac_uncert"
    )
    .map_err(write_err)?;

    for r in records {
        writeln!(
            file,
            "{},{},{},{},{:.10},{},{},{:.10},{},{},{},{},{},{},{}",
            r.nh,
            r.d,
            cell(r.red_chi_squared),
            cell(r.gamma),
            r.power_norm_fake,
            cell(r.power_norm_fit),
            cell(r.temp),
            r.disk_norm_fake,
            cell(r.disk_norm_fit),
            cell(r.error_disk_norm_low),
            cell(r.error_disk_norm_up),
            cell(r.d_fit),
            cell(r.error_d_low),
            cell(r.error_d_up),
            cell(r.frac_uncert),
        )
        .map_err(write_err)?;
    }
    Ok(())
}

/// One row per group, in axis declaration order.
pub fn write_reduced_csv(path: &Path, summaries: &[GroupSummary]) -> Result<(), AppError> {
    let mut file = create(path)?;
    let write_err =
        |e: std::io::Error| AppError::io(format!("Failed to write CSV '{}'", path.display()), e);

    writeln!(
        file,
        "nH,d,n_success,red_chi_squared,gamma,power_norm_fake,power_norm_fit,temp,\
         disk_norm_fake,disk_norm_fit,error_disk_norm,d_fit,error_d,frac_uncert,med_frac_uncert"
    )
    .map_err(write_err)?;

    for s in summaries {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            s.nh,
            s.d,
            s.n_success,
            cell(s.red_chi_squared),
            cell(s.gamma),
            cell(s.power_norm_fake),
            cell(s.power_norm_fit),
            cell(s.temp),
            cell(s.disk_norm_fake),
            cell(s.disk_norm_fit),
            cell(s.error_disk_norm),
            cell(s.d_fit),
            cell(s.error_d),
            cell(s.frac_uncert),
            cell(s.med_frac_uncert),
        )
        .map_err(write_err)?;
    }
    Ok(())
}
