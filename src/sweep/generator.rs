//! Task generation.
//!
//! Expands the declared parameter axes into their full cross-product, outer
//! to inner in declaration order (`nH` outer, `d` inner), repeating each
//! combination for a configured number of stochastic iterations. Iteration
//! ids come from one running counter across the entire sweep and are never
//! reused, so no two tasks can ever collide on a scratch resource name.

use crate::domain::{GroupKey, Task};
use crate::error::AppError;

/// Generate the ordered task list for one run.
///
/// Pure and infallible apart from rejecting empty axes or a zero iteration
/// count, which would silently produce an empty sweep.
pub fn generate(
    nh_values: &[f64],
    d_values: &[f64],
    iterations_per_combination: usize,
) -> Result<Vec<Task>, AppError> {
    if nh_values.is_empty() || d_values.is_empty() {
        return Err(AppError::new(2, "Parameter axes must be non-empty."));
    }
    if iterations_per_combination == 0 {
        return Err(AppError::new(2, "Iterations per combination must be >= 1."));
    }

    let mut tasks = Vec::with_capacity(nh_values.len() * d_values.len() * iterations_per_combination);
    let mut iteration: u64 = 0;
    for &nh in nh_values {
        for &d in d_values {
            for _ in 0..iterations_per_combination {
                tasks.push(Task {
                    key: GroupKey { nh, d },
                    iteration,
                });
                iteration += 1;
            }
        }
    }
    Ok(tasks)
}
