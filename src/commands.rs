//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run YAML test scenarios
    Run {
        /// Paths to the YAML test scenario files
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Print results as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Keep going after a failing scenario, overriding the config file
        #[arg(long)]
        no_fail_fast: bool,
    },

    /// List the key names scenarios may use
    Keys,

    /// Show the effective configuration and where it was loaded from
    Config,
}
