//! The sweep core: task generation, fault-tolerant execution, aggregation.
//!
//! Control flow: [`generator::generate`] expands the parameter axes into an
//! ordered task list; [`supervisor::Supervisor`] executes it over a bounded
//! worker pool with per-task deadlines and pool restarts;
//! [`aggregate::aggregate`] folds the recorded outcomes into per-group
//! median summaries.

pub mod aggregate;
pub mod generator;
pub mod supervisor;

pub use aggregate::aggregate;
pub use generator::generate;
pub use supervisor::{RunReport, Supervisor, SupervisorConfig, TrialError, TrialFn};
