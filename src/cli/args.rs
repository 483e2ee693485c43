//! CLI argument definitions using clap
//!
//! Commands:
//! - explain-guard classify --plan <path>
//! - explain-guard report --plan <path>
//! - explain-guard check --config <path> --query <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// explain-guard - reject queries whose winning plan scans or sorts in memory
#[derive(Parser, Debug)]
#[command(name = "explain-guard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify explain output and print a JSON verdict
    Classify {
        /// Explain output: record list, single record or bare plan ("-" for stdin)
        #[arg(long, default_value = "-")]
        plan: PathBuf,
    },

    /// Print the winning plan tree and its verdict
    Report {
        /// Explain output: record list, single record or bare plan ("-" for stdin)
        #[arg(long, default_value = "-")]
        plan: PathBuf,
    },

    /// Decide whether a query would be intercepted
    Check {
        /// Path to guard configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Query descriptor ("-" for stdin)
        #[arg(long, default_value = "-")]
        query: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
