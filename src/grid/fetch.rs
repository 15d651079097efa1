//! One-time download of the correction grid.
//!
//! The grid rarely changes and is small, so the policy is simple: if the
//! configured local path is missing, fetch the file once from a fixed
//! upstream location and cache it there. Every later run reuses the cache.

use std::path::Path;

use reqwest::blocking::Client;

use crate::error::AppError;
use crate::grid::Grid;

/// Upstream location of the correction table (JSON conversion of the
/// `bhspinf` gGR/gNT data). Thanks Greg!
pub const DEFAULT_GRID_URL: &str =
    "https://raw.githubusercontent.com/gregsalvesen/bhspinf/main/data/GR/gGR_gNT_J1655.json";

/// Resolve the grid URL, honoring an `XRBSWEEP_GRID_URL` override from the
/// environment or a `.env` file.
pub fn grid_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("XRBSWEEP_GRID_URL").unwrap_or_else(|_| DEFAULT_GRID_URL.to_string())
}

/// Download the grid file to `dest`, creating parent directories as needed.
pub fn fetch_grid(url: &str, dest: &Path) -> Result<(), AppError> {
    let resp = Client::new()
        .get(url)
        .send()
        .map_err(|e| AppError::new(4, format!("Grid download from {url} failed: {e}")))?;

    if !resp.status().is_success() {
        return Err(AppError::new(
            4,
            format!("Grid download from {url} failed with status {}.", resp.status()),
        ));
    }

    let body = resp
        .bytes()
        .map_err(|e| AppError::new(4, format!("Grid download from {url} failed mid-body: {e}")))?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::io(format!("Failed to create grid directory '{}'", parent.display()), e)
            })?;
        }
    }
    std::fs::write(dest, &body)
        .map_err(|e| AppError::io(format!("Failed to write grid file '{}'", dest.display()), e))
}

/// Load the grid, fetching it first if the local cache is absent.
pub fn ensure_grid(path: &Path) -> Result<Grid, AppError> {
    if !path.is_file() {
        let url = grid_url();
        eprintln!("Grid file '{}' not found; fetching from {url} ...", path.display());
        fetch_grid(&url, path)?;
    }
    Grid::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_grid;

    #[test]
    fn ensure_grid_uses_an_existing_cache_without_network() {
        let path = std::env::temp_dir().join(format!("xrbsweep_grid_test_{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&test_grid()).unwrap()).unwrap();

        let grid = ensure_grid(&path).unwrap();
        assert_eq!(grid.a_grid.len(), 4);
        assert_eq!(grid.g_gr[0].len(), grid.i_grid.len());

        std::fs::remove_file(&path).ok();
    }
}
