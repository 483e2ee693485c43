//! CLI module for explain-guard
//!
//! Provides command-line interface for:
//! - classify: JSON verdict for captured explain output
//! - report: textual plan tree and verdict
//! - check: whether a query would be intercepted under a config

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check, check_result, classify_plan, plan_from_input, report, run, run_command, verdict,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json, write_json, write_text};
