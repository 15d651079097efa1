//! `xrb-sweep` library crate.
//!
//! The binary (`xrbsweep`) is a thin wrapper around this library so that:
//!
//! - the sweep pipeline is testable without spawning processes
//! - modules are reusable (e.g., batch drivers, notebooks, future services)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod grid;
pub mod io;
pub mod report;
pub mod sim;
pub mod sweep;
