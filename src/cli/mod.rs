//! CLI command handling
//!
//! Dispatches CLI commands to the scenario runner and formats output.

use std::path::PathBuf;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::input::Key;
use crate::testing::{self, TestResult};

/// Dispatch a CLI command
pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenarios,
            verbose,
            json,
            no_fail_fast,
        } => {
            let config = Config::load()?;
            let verbose = verbose || config.runner.verbose;
            let fail_fast = config.runner.fail_fast && !no_fail_fast;

            let results = run_all(&scenarios, &config, verbose, fail_fast)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_summary(&results, scenarios.len());
            }

            let failed = results.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::TestAssertion(format!(
                    "{} of {} scenario(s) failed",
                    failed,
                    results.len()
                )));
            }
            Ok(())
        }

        Commands::Keys => {
            for key in Key::ALL {
                let marker = if key.is_modifier() {
                    format!(" ({})", key.modifier())
                } else {
                    String::new()
                };
                println!("{}{}", key, marker);
            }
            Ok(())
        }

        Commands::Config => {
            match paths::config_path() {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!("Config file: {} (not found, using defaults)", path.display()),
                None => println!("Config file: none (using defaults)"),
            }
            let config = Config::load()?;
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

/// Run each scenario in order, stopping at the first failure when `fail_fast`
fn run_all(
    scenarios: &[PathBuf],
    config: &Config,
    verbose: bool,
    fail_fast: bool,
) -> Result<Vec<TestResult>> {
    let mut results = Vec::with_capacity(scenarios.len());

    for path in scenarios {
        let result = testing::run_scenario_with(path, config, verbose)?;
        let passed = result.passed;
        results.push(result);

        if !passed && fail_fast {
            tracing::info!(scenario = %path.display(), "Stopping after first failure");
            break;
        }
    }

    Ok(results)
}

fn print_summary(results: &[TestResult], requested: usize) {
    println!("Results:");
    for result in results {
        let status = if result.passed { "✓" } else { "✗" };
        match &result.error {
            Some(error) => println!(
                "  {} {} ({}/{} steps): {}",
                status, result.name, result.steps_run, result.steps_total, error
            ),
            None => println!(
                "  {} {} ({}/{} steps)",
                status, result.name, result.steps_run, result.steps_total
            ),
        }
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let skipped = requested - results.len();
    if skipped > 0 {
        println!("{} passed, {} failed, {} skipped", passed, results.len() - passed, skipped);
    } else {
        println!("{} passed, {} failed", passed, results.len() - passed);
    }
}
