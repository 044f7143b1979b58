//! End-to-end tests for the YAML scenario runner
//!
//! Each fixture under `tests/fixtures/` is run through the same entry point
//! the CLI uses. Scenarios drive the process-wide keyboard, so they are
//! serialized with the keyboard tests' key.

use std::path::PathBuf;

use serial_test::serial;
use ui_harness::common::config::Config;
use ui_harness::common::logging;
use ui_harness::runtime::DispatcherPriority;
use ui_harness::testing::{self, TestResult};
use ui_harness::{Key, Keyboard};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run_fixture(name: &str, config: &Config) -> TestResult {
    logging::init_test();
    testing::run_scenario_with(&fixture(name), config, true)
        .unwrap_or_else(|e| panic!("failed to load {}: {}", name, e))
}

fn assert_passed(result: &TestResult) {
    assert!(
        result.passed,
        "{} failed at step {}: {:?}",
        result.name, result.steps_run, result.error
    );
    assert_eq!(result.steps_run, result.steps_total);
}

#[test]
#[serial(keyboard)]
fn test_keyboard_basics_scenario() {
    assert_passed(&run_fixture("keyboard_basics.yaml", &Config::default()));
}

#[test]
#[serial(keyboard)]
fn test_modifier_bindings_scenario() {
    assert_passed(&run_fixture("modifier_bindings.yaml", &Config::default()));
}

#[test]
#[serial(keyboard)]
fn test_failing_control_scenario() {
    assert_passed(&run_fixture("failing_control.yaml", &Config::default()));
}

#[test]
#[serial(keyboard)]
fn test_mouse_scenario() {
    assert_passed(&run_fixture("mouse.yaml", &Config::default()));
}

#[test]
#[serial(keyboard)]
fn test_dispatcher_drain_scenario() {
    assert_passed(&run_fixture("dispatcher_drain.yaml", &Config::default()));
}

#[test]
#[serial(keyboard)]
fn test_failed_expectation_is_reported() {
    let result = run_fixture("failing_assertion.yaml", &Config::default());

    assert!(!result.passed);
    assert_eq!(result.steps_run, 1);
    assert_eq!(result.steps_total, 2);
    assert_eq!(result.error.as_deref(), Some("Test assertion failed: Expected A to be down"));
}

#[test]
#[serial(keyboard)]
fn test_configured_sentinel_priority_is_used_by_default() {
    let mut config = Config::default();
    config.drain.sentinel_priority = DispatcherPriority::ApplicationIdle;

    let scenario: testing::TestScenario = serde_yaml::from_str(
        r#"
name: Idle drain
steps:
  - action: post
    label: idle
    priority: application_idle
  - action: post
    label: normal
  - action: drain
  - action: expect_log
    equals: [normal, idle]
"#,
    )
    .unwrap();

    logging::init_test();
    assert_passed(&testing::run(&scenario, &config, false));
}

#[test]
#[serial(keyboard)]
fn test_scenario_never_leaves_keys_pressed() {
    let scenario: testing::TestScenario = serde_yaml::from_str(
        r#"
name: Leaves keys down
steps:
  - action: press
    key: LeftCtrl
  - action: press
    key: Z
"#,
    )
    .unwrap();

    logging::init_test();
    assert_passed(&testing::run(&scenario, &Config::default(), false));
    assert!(Keyboard::is_key_up(Key::LeftCtrl));
    assert!(Keyboard::is_key_up(Key::Z));
}

#[test]
fn test_missing_scenario_file_is_an_error() {
    logging::init_test();
    let err = testing::run_scenario_with(&fixture("does_not_exist.yaml"), &Config::default(), false)
        .unwrap_err();
    assert!(err.to_string().contains("does_not_exist.yaml"));
}
