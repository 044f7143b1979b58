//! Scenario runner
//!
//! Reads YAML test scenarios and drives them through the synthetic keyboard,
//! mouse and dispatcher. Assertions are made against recorded notifications
//! and the intercepted keyboard state rather than printed output.

mod config;
mod runner;

pub use config::*;
pub use runner::{load_scenario, run, run_scenario, run_scenario_with, TestResult};
