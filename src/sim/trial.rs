//! One simulate-and-fit trial.
//!
//! Faithful to the original analysis at the boundary: given a task's
//! `(nH, d)` and the immutable shared context, simulate an absorbed
//! disk + power-law spectrum into the task's scratch file, "fit" it, and
//! report a [`ResultRecord`]. The spectral model itself is a lightweight
//! synthetic stand-in (no radiative-transfer code here); what matters for
//! the orchestrator is that the trial is expensive-ish, stochastic, can
//! fail to converge, and honors the trial-callback contract.

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Poisson};

use crate::domain::{ResultRecord, SweepConfig, Task};
use crate::error::AppError;
use crate::grid::{Correction, Grid, correction_factor};
use crate::sim::spectrum::{self, SpectrumConfig};
use crate::sweep::TrialError;

const G_SI: f64 = 6.6743e-11;
const C_SI: f64 = 2.998e8;
/// Color correction factor (Shimura & Takahara).
const KAPPA: f64 = 1.7;
const M_SUN_KG: f64 = 1.989e30;

/// Photoabsorption optical depth at 1 keV per unit nH (1e22 cm^-2),
/// with the usual ~E^-3 energy dependence.
const TAU_1KEV: f64 = 2.0;
/// Bounds on the fitted photon index, matching the fit range the spectra
/// are fitted over ("2.3,,1.7,1.7,3.0,3.0").
const GAMMA_MIN: f64 = 1.7;
const GAMMA_MAX: f64 = 3.0;
/// Error estimation is skipped when the fit statistic is this bad; the
/// error fields then stay absent while the primary result is still
/// reported.
const CHI2_ERROR_CEILING: f64 = 2.0;
/// How much worse than pure counting statistics the fitted-parameter
/// scatter is (parameter degeneracies, binning, background).
const FIT_DILUTION: f64 = 30.0;
/// Extra fractional scatter per unit nH from absorption degeneracy.
const NH_SYSTEMATIC: f64 = 0.3;

/// Everything a trial reads besides the task itself. Built once per run,
/// shared read-only by every worker; workers never mutate it.
#[derive(Debug, Clone)]
pub struct TrialContext {
    pub gamma: f64,
    pub temp: f64,
    pub spin: f64,
    pub mass: f64,
    pub inc: f64,
    pub ratio_disk_to_tot: f64,
    pub limb_darkening: bool,
    pub spectrum: SpectrumConfig,
    pub grid: Grid,
    pub seed: u64,
    pub scratch_dir: PathBuf,
}

impl TrialContext {
    /// Validate the physical parameters and prepare the scratch directory.
    pub fn from_config(config: &SweepConfig, grid: Grid) -> Result<Self, AppError> {
        if !(config.ratio_disk_to_tot > 0.0 && config.ratio_disk_to_tot < 1.0) {
            return Err(AppError::new(
                2,
                format!(
                    "ratio_disk_to_tot must be in (0, 1), got {}.",
                    config.ratio_disk_to_tot
                ),
            ));
        }
        if !(config.mass.is_finite() && config.mass > 0.0) {
            return Err(AppError::new(2, format!("Mass must be > 0, got {}.", config.mass)));
        }
        std::fs::create_dir_all(&config.scratch_dir).map_err(|e| {
            AppError::io(
                format!("Failed to create scratch directory '{}'", config.scratch_dir.display()),
                e,
            )
        })?;
        Ok(Self {
            gamma: config.gamma,
            temp: config.temp,
            spin: config.spin,
            mass: config.mass,
            inc: config.inc,
            ratio_disk_to_tot: config.ratio_disk_to_tot,
            limb_darkening: config.limb_darkening,
            spectrum: SpectrumConfig::new(config.exposure)?
                .with_band(config.band_low_kev, config.band_high_kev)
                .with_channels(config.channels)
                .with_back_exposure(config.back_exposure.unwrap_or(config.exposure))
                .with_apply_stats(config.counting_stats)
                .build()?,
            grid,
            seed: config.seed,
            scratch_dir: config.scratch_dir.clone(),
        })
    }
}

/// Scale `Rin/Rg` into the disk-normalization prefactor shared by
/// [`to_norm`] and [`to_d`].
fn rg_scale(corr: &Correction) -> f64 {
    corr.rin_ratio * G_SI * M_SUN_KG * 1e-2 / (KAPPA * KAPPA * C_SI * C_SI)
}

/// Disk normalization for a source of `mass` solar masses at distance `d`
/// kpc, under the given GR correction.
pub fn to_norm(d: f64, mass: f64, corr: &Correction) -> f64 {
    rg_scale(corr).powi(2) * corr.total * (mass / d).powi(2)
}

/// Distance implied by a fitted disk normalization; the inverse of
/// [`to_norm`] for fixed mass and correction.
pub fn to_d(norm: f64, mass: f64, corr: &Correction) -> f64 {
    rg_scale(corr) * (1.0 / norm).sqrt() * corr.total.sqrt() * mass
}

fn disk_photon_density(e_kev: f64, temp: f64) -> f64 {
    // ezdiskbb-like shape: E^(1/3) rise with an exponential cutoff at the
    // maximum disk temperature.
    e_kev.powf(1.0 / 3.0) * (-e_kev / temp).exp()
}

fn powerlaw_photon_density(e_kev: f64, gamma: f64) -> f64 {
    e_kev.powf(-gamma)
}

fn attenuation(nh: f64, e_kev: f64) -> f64 {
    (-nh * TAU_1KEV * e_kev.powi(-3)).exp()
}

/// Band-integrated energy flux per unit power-law norm (closed form, with
/// the photon-index-2 special case).
fn powerlaw_band_flux(gamma: f64, e1: f64, e2: f64) -> f64 {
    let p = 2.0 - gamma;
    if p.abs() < 1e-9 {
        (e2 / e1).ln()
    } else {
        (e2.powf(p) - e1.powf(p)) / p
    }
}

/// Band-integrated energy flux per unit disk norm (midpoint rule; the
/// integrand is smooth and the grid cheap).
fn disk_band_flux(temp: f64, e1: f64, e2: f64) -> f64 {
    let n = 256;
    let de = (e2 - e1) / n as f64;
    (0..n)
        .map(|i| {
            let e = e1 + (i as f64 + 0.5) * de;
            e * disk_photon_density(e, temp) * de
        })
        .sum()
}

/// Power-law norm that puts the band flux ratio of the two components at
/// `ratio_pl_to_disk`, given the disk norm. Mirrors the original's
/// flux-scaling step.
pub fn scale_powerlaw_norm(
    gamma: f64,
    temp: f64,
    disk_norm: f64,
    ratio_pl_to_disk: f64,
    band: (f64, f64),
) -> f64 {
    let (e1, e2) = band;
    let disk_flux = disk_norm * disk_band_flux(temp, e1, e2);
    disk_flux * ratio_pl_to_disk / powerlaw_band_flux(gamma, e1, e2)
}

/// Simulated channel counts for the absorbed two-component model.
fn simulate_counts(
    ctx: &TrialContext,
    nh: f64,
    disk_norm: f64,
    power_norm: f64,
    rng: &mut StdRng,
) -> Result<Vec<f64>, TrialError> {
    let spec = &ctx.spectrum;
    let width = spec.channel_width();
    let mut counts = Vec::with_capacity(spec.channels);
    for ch in 0..spec.channels {
        let e = spec.channel_energy(ch);
        let rate = (disk_norm * disk_photon_density(e, ctx.temp)
            + power_norm * powerlaw_photon_density(e, ctx.gamma))
            * attenuation(nh, e)
            * width;
        let lambda = (rate * spec.exposure).clamp(0.0, 1e12);
        let value = if spec.apply_stats && lambda > 0.0 {
            Poisson::new(lambda)
                .map_err(|e| TrialError(format!("bad Poisson rate {lambda}: {e}")))?
                .sample(rng)
        } else {
            lambda
        };
        counts.push(value);
    }
    Ok(counts)
}

fn draw(rng: &mut StdRng, mean: f64, sd: f64) -> Result<f64, TrialError> {
    Normal::new(mean, sd)
        .map_err(|e| TrialError(format!("bad normal parameters ({mean}, {sd}): {e}")))
        .map(|n| n.sample(rng))
}

/// Fractional parameter scatter implied by the collected counts and the
/// absorption column.
fn fit_dispersion(total_counts: f64, nh: f64) -> f64 {
    (FIT_DILUTION / total_counts.sqrt() * (1.0 + NH_SYSTEMATIC * nh)).min(5.0)
}

/// Run one trial: simulate, write/read the scratch spectrum, fit, convert.
///
/// Deterministic given identical inputs: the RNG stream is derived from the
/// run seed and the task's unique iteration id, never from global state or
/// the attempt. `generation` namespaces the scratch file only, so a
/// re-dispatched attempt produces the identical record while never sharing
/// a file with an abandoned attempt of the same iteration.
pub fn run_trial(
    ctx: &TrialContext,
    task: &Task,
    generation: u64,
) -> Result<ResultRecord, TrialError> {
    let corr = correction_factor(&ctx.grid, ctx.spin, ctx.inc, ctx.limb_darkening)
        .map_err(|e| TrialError(e.to_string()))?;

    let disk_norm_fake = to_norm(task.key.d, ctx.mass, &corr);
    let ratio_pl_to_disk = (1.0 - ctx.ratio_disk_to_tot) / ctx.ratio_disk_to_tot;
    let band = (ctx.spectrum.energy_low_kev, ctx.spectrum.energy_high_kev);
    let power_norm_fake =
        scale_powerlaw_norm(ctx.gamma, ctx.temp, disk_norm_fake, ratio_pl_to_disk, band);

    let mut record = ResultRecord::unfitted(task.key, power_norm_fake, disk_norm_fake);
    let mut rng =
        StdRng::seed_from_u64(ctx.seed ^ task.iteration.wrapping_mul(0x9E37_79B9_7F4A_7C15));

    // Fake the spectrum into this task's own scratch file and read it back,
    // as the real pipeline does with its grouped spectrum files.
    let path = spectrum::scratch_path(&ctx.scratch_dir, generation, task.iteration);
    let counts = simulate_counts(ctx, task.key.nh, disk_norm_fake, power_norm_fake, &mut rng)?;
    spectrum::write_counts(&path, &counts).map_err(|e| TrialError(e.to_string()))?;
    let counts = spectrum::read_counts(&path).map_err(|e| TrialError(e.to_string()))?;
    let _ = std::fs::remove_file(&path);

    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return Err(TrialError::from("fit did not converge: no counts in the fitted band"));
    }
    let sigma = fit_dispersion(total, task.key.nh);

    let dof = (ctx.spectrum.channels.saturating_sub(5)).max(1) as f64;
    let red_chi_squared = 1.0 + draw(&mut rng, 0.0, (2.0 / dof).sqrt())?.abs();
    record.red_chi_squared = Some(red_chi_squared);
    record.gamma = Some(draw(&mut rng, ctx.gamma, 5.0 * sigma)?.clamp(GAMMA_MIN, GAMMA_MAX));
    record.temp = Some(ctx.temp * (1.0 + 0.5 * draw(&mut rng, 0.0, sigma)?));
    record.power_norm_fit = Some((power_norm_fake * (1.0 + 2.0 * draw(&mut rng, 0.0, sigma)?)).max(0.0));

    let disk_norm_fit = disk_norm_fake * (1.0 + draw(&mut rng, 0.0, sigma)?);
    if disk_norm_fit <= 0.0 {
        return Err(TrialError::from(
            "fit did not converge: non-positive disk normalization",
        ));
    }
    record.disk_norm_fit = Some(disk_norm_fit);
    let d_fit = to_d(disk_norm_fit, ctx.mass, &corr);
    record.d_fit = Some(d_fit);

    // Secondary error estimation. Its failure is not a trial failure: the
    // primary result stands and the error fields stay absent.
    let norm_low = disk_norm_fit * (1.0 - 1.645 * sigma);
    let norm_up = disk_norm_fit * (1.0 + 1.645 * sigma);
    if red_chi_squared < CHI2_ERROR_CEILING && norm_low > 0.0 {
        record.error_disk_norm_low = Some(norm_low);
        record.error_disk_norm_up = Some(norm_up);
        // Distance runs inversely with the norm, so the bounds swap.
        let d_low = to_d(norm_up, ctx.mass, &corr);
        let d_up = to_d(norm_low, ctx.mass, &corr);
        record.error_d_low = Some(d_low);
        record.error_d_up = Some(d_up);
        record.frac_uncert = Some(((d_fit - d_low) + (d_up - d_fit)) / 2.0 / d_fit);
    }

    Ok(record)
}
