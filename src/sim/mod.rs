//! The simulate-and-fit collaborator.
//!
//! The orchestration core treats a trial as an opaque callback; this module
//! is the thin physical glue behind that callback: disk-normalization to
//! distance conversions through the GR correction grid, a scratch-backed
//! fake spectrum, and a noisy fit. Everything here is pure given the task,
//! the immutable [`trial::TrialContext`], and the task's own scratch file.

pub mod spectrum;
pub mod trial;

pub use spectrum::SpectrumConfig;
pub use trial::{TrialContext, run_trial, to_d, to_norm};
