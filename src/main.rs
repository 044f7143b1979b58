//! UI Harness CLI - Run deterministic input scenarios
//!
//! This CLI tool drives YAML scenarios through the synthetic keyboard, mouse
//! and dispatcher, and reports which assertions held.

use clap::Parser;
use commands::Commands;
use ui_harness::common::logging;
use ui_harness::{cli, commands};

#[derive(Parser)]
#[command(name = "ui-harness", about = "Deterministic UI input test harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);

    if let Err(e) = cli::dispatch(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
