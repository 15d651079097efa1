//! Fake-spectrum configuration and scratch files.
//!
//! Every option the simulated spectrum recognizes lives in
//! [`SpectrumConfig`], validated once at construction; there is no
//! pass-through of unchecked keyword settings. Each trial attempt owns one
//! scratch file namespaced by pool generation and iteration id, and a
//! reclamation pass sweeps up files abandoned by dead generations.

use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Scratch files are `fake_spectrum_<generation>_<iteration>.dat` under the
/// scratch dir. The generation component matters: a detached worker from a
/// terminated pool can still be mid-trial when the replacement generation
/// re-runs the same iteration, and the two attempts must never share a
/// file.
const SCRATCH_PREFIX: &str = "fake_spectrum_";

/// Settings for one faked spectrum.
///
/// `new` applies the conventional defaults (background exposure equal to
/// source exposure, the 2-20 keV band, counting statistics on); the `with_*`
/// setters override them. `validate` runs in `new` and after every setter
/// chain via [`Self::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumConfig {
    /// Source exposure in seconds.
    pub exposure: f64,
    /// Background exposure in seconds.
    pub back_exposure: f64,
    /// Apply Poisson counting statistics to the simulated counts.
    pub apply_stats: bool,
    /// Lower edge of the fitted band, keV.
    pub energy_low_kev: f64,
    /// Upper edge of the fitted band, keV.
    pub energy_high_kev: f64,
    /// Spectral channels across the band.
    pub channels: usize,
}

impl SpectrumConfig {
    pub fn new(exposure: f64) -> Result<Self, AppError> {
        let config = Self {
            exposure,
            back_exposure: exposure,
            apply_stats: true,
            energy_low_kev: 2.0,
            energy_high_kev: 20.0,
            channels: 128,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_back_exposure(mut self, back_exposure: f64) -> Self {
        self.back_exposure = back_exposure;
        self
    }

    pub fn with_band(mut self, low_kev: f64, high_kev: f64) -> Self {
        self.energy_low_kev = low_kev;
        self.energy_high_kev = high_kev;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_apply_stats(mut self, apply_stats: bool) -> Self {
        self.apply_stats = apply_stats;
        self
    }

    /// Re-validate after a setter chain.
    pub fn build(self) -> Result<Self, AppError> {
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !(self.exposure.is_finite() && self.exposure > 0.0) {
            return Err(AppError::new(2, format!("Exposure must be finite and > 0, got {}.", self.exposure)));
        }
        if !(self.back_exposure.is_finite() && self.back_exposure > 0.0) {
            return Err(AppError::new(
                2,
                format!("Background exposure must be finite and > 0, got {}.", self.back_exposure),
            ));
        }
        if !(self.energy_low_kev.is_finite()
            && self.energy_high_kev.is_finite()
            && self.energy_low_kev > 0.0
            && self.energy_high_kev > self.energy_low_kev)
        {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid energy band [{}, {}] keV (must be finite, > 0, and ordered).",
                    self.energy_low_kev, self.energy_high_kev
                ),
            ));
        }
        if self.channels < 8 {
            return Err(AppError::new(2, "A spectrum needs at least 8 channels."));
        }
        Ok(())
    }

    /// Channel width in keV.
    pub fn channel_width(&self) -> f64 {
        (self.energy_high_kev - self.energy_low_kev) / self.channels as f64
    }

    /// Midpoint energy of channel `ch`, keV.
    pub fn channel_energy(&self, ch: usize) -> f64 {
        self.energy_low_kev + (ch as f64 + 0.5) * self.channel_width()
    }
}

/// The scratch file owned by one task attempt.
pub fn scratch_path(dir: &Path, generation: u64, iteration: u64) -> PathBuf {
    dir.join(format!("{SCRATCH_PREFIX}{generation}_{iteration}.dat"))
}

/// Write simulated channel counts, one per line.
pub fn write_counts(path: &Path, counts: &[f64]) -> Result<(), AppError> {
    let mut body = String::with_capacity(counts.len() * 8);
    for c in counts {
        body.push_str(&format!("{c:.1}\n"));
    }
    std::fs::write(path, body)
        .map_err(|e| AppError::io(format!("Failed to write scratch spectrum '{}'", path.display()), e))
}

/// Read simulated channel counts back.
pub fn read_counts(path: &Path) -> Result<Vec<f64>, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read scratch spectrum '{}'", path.display()), e))?;
    let mut counts = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let value: f64 = line.trim().parse().map_err(|e| {
            AppError::new(
                4,
                format!("Bad count on line {} of '{}': {e}", lineno + 1, path.display()),
            )
        })?;
        counts.push(value);
    }
    Ok(counts)
}

/// Best-effort sweep of scratch files left behind by dead pool
/// generations. Only files whose generation is below `before_generation`
/// are touched: a lingering detached worker may still be writing its own
/// (dead-generation) file, but the live generation's files stay untouched.
/// Returns the number of files removed. Never fails the run: a file that
/// refuses to go away is someone else's problem at this point.
pub fn reclaim_scratch(dir: &Path, before_generation: u64) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(rest) = name.strip_prefix(SCRATCH_PREFIX) else { continue };
        let Some(generation) = rest.split('_').next().and_then(|g| g.parse::<u64>().ok()) else {
            continue;
        };
        if generation < before_generation && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    removed
}
