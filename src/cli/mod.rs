//! Command-line parsing for the sweep orchestrator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the orchestration/simulation code. The `run`
//! positional arguments mirror the submission scripts that drive this tool
//! under a scheduler: `xrbsweep run <gamma> <temp> <a> <mass> <inc> <ratio>
//! <exposure> --task-deadline-secs 30 --max-consecutive-timeouts 10`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "xrbsweep", version, about = "Fault-tolerant X-ray binary simulation sweeps")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a full parameter sweep and write the result tables.
    Run(RunArgs),
    /// Download (or refresh) the GR correction grid cache.
    FetchGrid(FetchGridArgs),
}

/// Options for a sweep run.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Power-law photon index of the simulated source.
    pub gamma: f64,

    /// Disk temperature in keV.
    pub temp: f64,

    /// Dimensionless black-hole spin.
    #[arg(value_name = "A")]
    pub spin: f64,

    /// Black-hole mass in solar masses.
    pub mass: f64,

    /// Inclination in degrees.
    pub inc: f64,

    /// Disk fraction of the total 2-20 keV flux, in (0, 1).
    #[arg(value_name = "RATIO")]
    pub ratio_disk_to_tot: f64,

    /// Exposure of each faked spectrum, seconds.
    pub exposure: f64,

    /// Lower edge of the simulated/fitted band, keV.
    #[arg(long, default_value_t = 2.0)]
    pub band_low_kev: f64,

    /// Upper edge of the simulated/fitted band, keV.
    #[arg(long, default_value_t = 20.0)]
    pub band_high_kev: f64,

    /// Spectral channels across the band.
    #[arg(long, default_value_t = 128)]
    pub channels: usize,

    /// Background exposure in seconds (default: the source exposure).
    #[arg(long)]
    pub back_exposure: Option<f64>,

    /// Simulate noiseless spectra (skip Poisson counting statistics).
    #[arg(long)]
    pub no_counting_stats: bool,

    /// Absorption-column axis (1e22 cm^-2), comma separated.
    #[arg(long = "nh", value_delimiter = ',', default_values_t = [0.1])]
    pub nh_values: Vec<f64>,

    /// Distance axis (kpc), comma separated.
    #[arg(
        long = "d",
        value_delimiter = ',',
        default_values_t = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 12.0, 18.0, 26.0]
    )]
    pub d_values: Vec<f64>,

    /// Stochastic iterations per (nH, d) combination.
    #[arg(long, default_value_t = 300)]
    pub iterations: usize,

    /// Worker threads (default: half the cores minus one).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-task deadline in seconds. Required: the right value depends on
    /// the host and the spectra, and a hung run is worse than a prompt.
    #[arg(long)]
    pub task_deadline_secs: u64,

    /// Consecutive timeouts beyond which the run hard-stops. Required for
    /// the same reason as the deadline.
    #[arg(long)]
    pub max_consecutive_timeouts: u32,

    /// Disable the limb-darkening term in the GR correction.
    #[arg(long)]
    pub no_limb_darkening: bool,

    /// Base seed for per-task RNG streams.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Local path of the GR correction grid (fetched there if missing).
    #[arg(long, default_value = "gGR_gNT_J1655.json")]
    pub grid_file: PathBuf,

    /// Directory for per-task scratch spectra.
    #[arg(long, default_value = "scratch")]
    pub scratch_dir: PathBuf,

    /// Directory for the output CSV tables.
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Append-only error log for hard stops and pool failures.
    #[arg(long, default_value = "sweep_errors.log")]
    pub error_log: PathBuf,
}

/// Options for pre-fetching the correction grid.
#[derive(Debug, Parser)]
pub struct FetchGridArgs {
    /// Local path to cache the grid at.
    #[arg(long, default_value = "gGR_gNT_J1655.json")]
    pub grid_file: PathBuf,

    /// Re-download even if the cache exists.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_deadline_and_threshold() {
        let base = [
            "xrbsweep", "run", "2.3", "0.7", "0.0", "8.0", "60.0", "0.5", "1000",
        ];
        assert!(Cli::try_parse_from(base).is_err());

        let full: Vec<&str> = base
            .iter()
            .copied()
            .chain(["--task-deadline-secs", "30", "--max-consecutive-timeouts", "10"])
            .collect();
        let cli = Cli::try_parse_from(full).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.gamma, 2.3);
        assert_eq!(args.task_deadline_secs, 30);
        assert_eq!(args.iterations, 300);
        assert_eq!(args.d_values.len(), 10);
    }

    #[test]
    fn axis_lists_parse_comma_separated() {
        let cli = Cli::try_parse_from([
            "xrbsweep",
            "run",
            "2.3",
            "0.7",
            "0.0",
            "8.0",
            "60.0",
            "0.5",
            "1000",
            "--task-deadline-secs",
            "30",
            "--max-consecutive-timeouts",
            "10",
            "--nh",
            "0.1,1.0,5.0",
            "--d",
            "2,8",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.nh_values, vec![0.1, 1.0, 5.0]);
        assert_eq!(args.d_values, vec![2.0, 8.0]);
    }

    #[test]
    fn spectrum_flags_override_the_defaults() {
        let cli = Cli::try_parse_from([
            "xrbsweep",
            "run",
            "2.3",
            "0.7",
            "0.0",
            "8.0",
            "60.0",
            "0.5",
            "1000",
            "--task-deadline-secs",
            "30",
            "--max-consecutive-timeouts",
            "10",
            "--band-low-kev",
            "3.0",
            "--band-high-kev",
            "15.0",
            "--channels",
            "64",
            "--back-exposure",
            "5000",
            "--no-counting-stats",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!((args.band_low_kev, args.band_high_kev), (3.0, 15.0));
        assert_eq!(args.channels, 64);
        assert_eq!(args.back_exposure, Some(5000.0));
        assert!(args.no_counting_stats);
    }
}
