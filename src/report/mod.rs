//! End-of-run reporting.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::sweep::RunReport;

/// Human-readable run summary for the terminal.
///
/// Operators mostly care about three numbers and whether the run ended by
/// finishing or by giving up; the error log carries the details of the
/// latter.
pub fn format_run_summary(
    report: &RunReport,
    n_groups: usize,
    elapsed: Duration,
    full_csv: &Path,
    reduced_csv: &Path,
) -> String {
    let (ok, timed_out, errored) = report.counts();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Completed {} of {} attempted tasks ({timed_out} timed out, {errored} errored).",
        ok,
        report.outcomes.len()
    );
    if report.halted {
        let _ = writeln!(
            out,
            "Run HALTED early: maximum consecutive timeouts exceeded (see the error log)."
        );
    }
    if report.stalled {
        let _ = writeln!(
            out,
            "Run STALLED: worker pool could not be recreated (see the error log)."
        );
    }
    let _ = writeln!(out, "Summarized {n_groups} parameter groups.");
    let _ = writeln!(out, "Full table:    {}", full_csv.display());
    let _ = writeln!(out, "Reduced table: {}", reduced_csv.display());
    let _ = writeln!(out, "The sweep took {:.1} seconds to complete.", elapsed.as_secs_f64());
    out
}
