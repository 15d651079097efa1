//! Run artifacts: CSV exports and the persistent error log.

pub mod errlog;
pub mod export;

pub use errlog::ErrorLog;
