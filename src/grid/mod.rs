//! The GR correction grid.
//!
//! A small multi-axis lookup table (after Salvesen & Miller's `bhspinf`
//! data) mapping black-hole spin and disk inclination onto relativistic
//! flux-correction factors. It is loaded once at startup, validated, and
//! then shared read-only by every task for the lifetime of the run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub mod fetch;
pub mod lookup;

pub use lookup::{Correction, correction_factor, nearest_index};

/// The correction table: sorted spin/inclination axes plus the tables they
/// index.
///
/// `g_gr` is 2-D (`[spin][inclination]`); `g_nt` and `r_grid` are 1-D over
/// the spin axis. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    /// Dimensionless spin axis, ascending.
    pub a_grid: Vec<f64>,
    /// Inner disk radius in gravitational radii, indexed by spin.
    pub r_grid: Vec<f64>,
    /// Inclination axis in degrees, ascending.
    pub i_grid: Vec<f64>,
    /// GR flux correction, `g_gr[spin][inclination]`.
    pub g_gr: Vec<Vec<f64>>,
    /// Novikov-Thorne correction, indexed by spin.
    pub g_nt: Vec<f64>,
}

impl Grid {
    /// Load and validate a grid from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read grid file '{}'", path.display()), e))?;
        let grid: Grid = serde_json::from_str(&raw).map_err(|e| {
            AppError::new(4, format!("Failed to parse grid file '{}': {e}", path.display()))
        })?;
        grid.validate()?;
        Ok(grid)
    }

    /// Shape and ordering checks. Run once at load; lookups assume these.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.a_grid.is_empty() || self.i_grid.is_empty() {
            return Err(AppError::new(4, "Grid has an empty spin or inclination axis."));
        }
        for (name, axis) in [("a_grid", &self.a_grid), ("i_grid", &self.i_grid)] {
            if axis.iter().any(|v| !v.is_finite()) {
                return Err(AppError::new(4, format!("Grid axis {name} contains non-finite values.")));
            }
            if axis.windows(2).any(|w| w[0] >= w[1]) {
                return Err(AppError::new(
                    4,
                    format!("Grid axis {name} must be strictly ascending."),
                ));
            }
        }
        let n_a = self.a_grid.len();
        let n_i = self.i_grid.len();
        if self.r_grid.len() != n_a || self.g_nt.len() != n_a {
            return Err(AppError::new(
                4,
                format!(
                    "Grid r_grid/g_nt lengths ({}, {}) do not match the spin axis ({n_a}).",
                    self.r_grid.len(),
                    self.g_nt.len()
                ),
            ));
        }
        if self.g_gr.len() != n_a || self.g_gr.iter().any(|row| row.len() != n_i) {
            return Err(AppError::new(
                4,
                format!("Grid g_gr must be {n_a} rows of {n_i} columns."),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_grid() -> Grid {
    Grid {
        a_grid: vec![0.0, 0.5, 0.9, 0.998],
        r_grid: vec![6.0, 4.23, 2.32, 1.24],
        i_grid: vec![0.0, 30.0, 60.0, 80.0],
        g_gr: vec![
            vec![1.00, 1.02, 1.08, 1.15],
            vec![0.98, 1.00, 1.06, 1.13],
            vec![0.95, 0.97, 1.03, 1.10],
            vec![0.92, 0.94, 1.00, 1.07],
        ],
        g_nt: vec![1.00, 0.99, 0.97, 0.95],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_grid_passes() {
        test_grid().validate().unwrap();
    }

    #[test]
    fn unsorted_axis_is_rejected() {
        let mut g = test_grid();
        g.i_grid[1] = 90.0;
        assert!(g.validate().is_err());
    }

    #[test]
    fn ragged_table_is_rejected() {
        let mut g = test_grid();
        g.g_gr[2].pop();
        assert!(g.validate().is_err());
    }

    #[test]
    fn mismatched_nt_length_is_rejected() {
        let mut g = test_grid();
        g.g_nt.pop();
        assert!(g.validate().is_err());
    }
}
