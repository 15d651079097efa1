//! Domain types used throughout the sweep pipeline.
//!
//! This module defines:
//!
//! - the unit of work (`Task`) and its grouping key (`GroupKey`)
//! - classified task results (`Outcome`, `ResultRecord`)
//! - per-group summaries (`GroupSummary`)
//! - run-wide configuration (`SweepConfig`)

pub mod types;

pub use types::*;
