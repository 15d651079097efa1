//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed across worker-pool channels during a sweep
//! - exported to CSV at run end
//! - inspected in tests without pulling in the simulation glue

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The parameter values that define one experiment group.
///
/// Repeated stochastic iterations of the same `(nH, d)` pair belong to the
/// same group and are summarized together. Equality is exact (bit-level):
/// group keys come verbatim from the declared axis values, never from
/// arithmetic, so approximate matching is neither needed nor wanted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupKey {
    /// Absorption column in units of 1e22 cm^-2.
    pub nh: f64,
    /// Source distance in kpc.
    pub d: f64,
}

impl GroupKey {
    /// Bit-level representation, usable as a hash-map key.
    pub fn bits(&self) -> (u64, u64) {
        (self.nh.to_bits(), self.d.to_bits())
    }
}

/// One independent unit of simulated work.
///
/// `iteration` is globally unique across the whole run (a running counter,
/// never reused, even across groups) and, together with the executing pool
/// generation, namespaces any per-attempt scratch resources, so no two
/// concurrently running attempts can collide on temp files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Task {
    pub key: GroupKey,
    pub iteration: u64,
}

/// The classified result of attempting one task.
///
/// Exactly one outcome is recorded per submitted task, in submission order,
/// except for tasks beyond a hard stop, which are never attempted and never
/// appear in any outcome list.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The trial completed within the deadline.
    Success(ResultRecord),
    /// The trial exceeded the per-task deadline and was abandoned.
    Timeout(Task),
    /// The trial failed for a reason other than the deadline (bad
    /// convergence, invalid parameters, a panic in the callback).
    Error(Task, String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Per-task result of one simulate-and-fit trial.
///
/// `*_fake` fields are the ground-truth values the spectrum was simulated
/// from; `*_fit` fields come from the fit. Fitted and derived fields are
/// `Option` because a fit can fail while the trial still returns: `None`
/// means "value unknown", which downstream aggregation must distinguish
/// from zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub nh: f64,
    pub d: f64,
    pub red_chi_squared: Option<f64>,
    pub gamma: Option<f64>,
    pub power_norm_fake: f64,
    pub power_norm_fit: Option<f64>,
    pub temp: Option<f64>,
    pub disk_norm_fake: f64,
    pub disk_norm_fit: Option<f64>,
    /// Lower/upper 90%-style bounds on the fitted disk normalization.
    ///
    /// These come from a secondary estimation step that is allowed to fail
    /// without failing the trial, so they can be absent even when the
    /// primary fit succeeded.
    pub error_disk_norm_low: Option<f64>,
    pub error_disk_norm_up: Option<f64>,
    pub d_fit: Option<f64>,
    pub error_d_low: Option<f64>,
    pub error_d_up: Option<f64>,
    pub frac_uncert: Option<f64>,
}

impl ResultRecord {
    /// A blank record carrying only the task parameters and ground truth.
    ///
    /// The trial starts from this and fills in fit fields as they become
    /// available, so a failed fit still reports what was simulated.
    pub fn unfitted(key: GroupKey, power_norm_fake: f64, disk_norm_fake: f64) -> Self {
        Self {
            nh: key.nh,
            d: key.d,
            red_chi_squared: None,
            gamma: None,
            power_norm_fake,
            power_norm_fit: None,
            temp: None,
            disk_norm_fake,
            disk_norm_fit: None,
            error_disk_norm_low: None,
            error_disk_norm_up: None,
            d_fit: None,
            error_d_low: None,
            error_d_up: None,
            frac_uncert: None,
        }
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            nh: self.nh,
            d: self.d,
        }
    }
}

/// Accessor for one named fitted field, used to drive aggregation and CSV
/// export from a single table instead of repeating the field list.
pub type FieldAccessor = fn(&ResultRecord) -> Option<f64>;

/// The fitted/derived fields that get a per-group median.
pub const FITTED_FIELDS: &[(&str, FieldAccessor)] = &[
    ("red_chi_squared", |r| r.red_chi_squared),
    ("gamma", |r| r.gamma),
    ("power_norm_fit", |r| r.power_norm_fit),
    ("temp", |r| r.temp),
    ("disk_norm_fit", |r| r.disk_norm_fit),
    ("d_fit", |r| r.d_fit),
    ("frac_uncert", |r| r.frac_uncert),
];

/// Per-group summary: medians of the fitted fields plus deviations from the
/// group's ground truth.
///
/// A group with zero successful records still produces a summary; all its
/// derived statistics are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub nh: f64,
    pub d: f64,
    pub n_success: usize,
    pub red_chi_squared: Option<f64>,
    pub gamma: Option<f64>,
    pub power_norm_fake: Option<f64>,
    pub power_norm_fit: Option<f64>,
    pub temp: Option<f64>,
    pub disk_norm_fake: Option<f64>,
    pub disk_norm_fit: Option<f64>,
    /// `median(disk_norm_fit) - disk_norm_fake`.
    pub error_disk_norm: Option<f64>,
    pub d_fit: Option<f64>,
    /// `median(d_fit) - d`.
    pub error_d: Option<f64>,
    /// `(median(d_fit) - d) / d`.
    pub frac_uncert: Option<f64>,
    /// Median of the per-record fractional uncertainties.
    pub med_frac_uncert: Option<f64>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults). The per-task deadline and
/// the consecutive-timeout threshold are deliberately *required* CLI inputs:
/// sensible values depend on the instrument response and the host, and a
/// silently wrong default hides hung runs.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Power-law photon index of the simulated source.
    pub gamma: f64,
    /// Disk temperature in keV.
    pub temp: f64,
    /// Dimensionless black-hole spin.
    pub spin: f64,
    /// Black-hole mass in solar masses.
    pub mass: f64,
    /// Inclination in degrees.
    pub inc: f64,
    /// Disk flux fraction of the total (0, 1).
    pub ratio_disk_to_tot: f64,
    /// Exposure of the faked spectrum in seconds.
    pub exposure: f64,
    /// Lower edge of the simulated/fitted band, keV.
    pub band_low_kev: f64,
    /// Upper edge of the simulated/fitted band, keV.
    pub band_high_kev: f64,
    /// Spectral channels across the band.
    pub channels: usize,
    /// Background exposure in seconds; `None` means the source exposure.
    pub back_exposure: Option<f64>,
    /// Apply Poisson counting statistics to the simulated counts.
    pub counting_stats: bool,

    /// Absorption-column axis (outer loop of the cross-product).
    pub nh_values: Vec<f64>,
    /// Distance axis (inner loop).
    pub d_values: Vec<f64>,
    /// Stochastic iterations per (nH, d) combination.
    pub iterations: usize,

    /// Worker count; `None` means half the available cores minus one.
    pub workers: Option<usize>,
    /// Per-task deadline in seconds.
    pub task_deadline_secs: u64,
    /// Consecutive timeouts beyond which the run hard-stops.
    pub max_consecutive_timeouts: u32,

    /// Apply the limb-darkening term in the GR correction.
    pub limb_darkening: bool,
    /// Base seed for per-task RNG streams.
    pub seed: u64,

    pub grid_path: PathBuf,
    pub scratch_dir: PathBuf,
    pub results_dir: PathBuf,
    pub error_log: PathBuf,
}
