//! Command-line interface for kernel-herding.
//!
//! Provides commands for subset selection, baseline inspection and
//! synthetic dataset generation.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, RunSummary};
