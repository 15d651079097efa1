//! Adaptive-tolerance nearest-index search over grid axes.
//!
//! Continuous user inputs (spin, inclination) rarely hit a tabulated axis
//! value exactly, so matching starts at a tight absolute tolerance and
//! escalates by factors of ten until at least one axis entry is close
//! enough. Ties are broken at the median of the matching index range, which
//! for a sorted axis is the middle of a contiguous run of equally close
//! entries.

use crate::error::AppError;
use crate::grid::Grid;

/// Relative tolerance, fixed across escalation steps.
pub const RTOL: f64 = 1e-5;
/// Starting absolute tolerance.
pub const ATOL0: f64 = 1e-8;
/// Escalation cap. 40 decades from 1e-8 covers any physically meaningful
/// axis span; running out means the target is NaN or absurdly far off-grid,
/// and looping forever on such input is worse than refusing it.
pub const MAX_ESCALATIONS: u32 = 40;

/// `|x - target| <= atol + RTOL * |target|`, the numpy `isclose` criterion.
fn is_close(x: f64, target: f64, atol: f64) -> bool {
    (x - target).abs() <= atol + RTOL * target.abs()
}

/// Find the index of the axis value nearest to `target`.
///
/// Starts at [`ATOL0`] and multiplies the absolute tolerance by 10 until at
/// least one entry matches. A unique match wins outright; several equally
/// close entries resolve to the median matching index, with a diagnostic on
/// stderr naming the value that was chosen.
///
/// Deterministic: identical inputs always produce identical indices.
pub fn nearest_index(axis: &[f64], target: f64) -> Result<usize, AppError> {
    if axis.is_empty() {
        return Err(AppError::new(4, "Cannot look up a value on an empty grid axis."));
    }

    let mut atol = ATOL0;
    for _ in 0..=MAX_ESCALATIONS {
        let matches: Vec<usize> = (0..axis.len())
            .filter(|&i| is_close(axis[i], target, atol))
            .collect();

        match matches.len() {
            0 => atol *= 10.0,
            1 => return Ok(matches[0]),
            _ => {
                let first = matches[0];
                let last = matches[matches.len() - 1];
                let idx = first + (last - first) / 2;
                eprintln!(
                    "Warning: {} grid values are equally close to {target}; taking the median value {} as the closest.",
                    matches.len(),
                    axis[idx]
                );
                return Ok(idx);
            }
        }
    }

    Err(AppError::new(
        4,
        format!(
            "No grid value within tolerance of {target} after {MAX_ESCALATIONS} escalations \
             (axis range [{}, {}]).",
            axis[0],
            axis[axis.len() - 1]
        ),
    ))
}

/// The resolved GR correction for one (spin, inclination) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// `g_gr * g_nt * cos(i)`, times the limb-darkening term when enabled.
    pub total: f64,
    /// Inner disk radius over gravitational radius at the resolved spin.
    pub rin_ratio: f64,
    /// The spin axis value actually used.
    pub resolved_spin: f64,
    /// The inclination axis value actually used, degrees.
    pub resolved_inc: f64,
}

/// Resolve `(spin, inc)` onto the grid and compose the total flux
/// correction.
///
/// Pure in its inputs and the immutable grid: two lookups (spin row, then
/// inclination column), then
/// `g_gr[a][i] * g_nt[a] * cos(i) * (1/2 + 3/4 cos(i))`, the last factor
/// dropping to 1 when limb darkening is disabled. The cosine uses the
/// *resolved* grid inclination, not the requested one, so the correction is
/// consistent with the tabulated row.
pub fn correction_factor(
    grid: &Grid,
    spin: f64,
    inc: f64,
    limb_darkening: bool,
) -> Result<Correction, AppError> {
    let a_idx = nearest_index(&grid.a_grid, spin)?;
    let i_idx = nearest_index(&grid.i_grid, inc)?;

    let resolved_inc = grid.i_grid[i_idx];
    let cos_i = (resolved_inc.to_radians()).cos();
    let limb = if limb_darkening {
        0.5 + 0.75 * cos_i
    } else {
        1.0
    };

    Ok(Correction {
        total: grid.g_gr[a_idx][i_idx] * grid.g_nt[a_idx] * cos_i * limb,
        rin_ratio: grid.r_grid[a_idx],
        resolved_spin: grid.a_grid[a_idx],
        resolved_inc,
    })
}
