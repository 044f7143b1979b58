//! Test runner implementation
//!
//! Executes YAML scenarios against a fresh dispatcher and element tree,
//! driving them through `TestKeyboard` and `TestMouse` and asserting through
//! the same query surface application code uses.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use colored::Colorize;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::harness::{DispatcherExt, TestKeyboard, TestMouse};
use crate::input::{Key, Keyboard, KeyboardDevice, ModifierKeys};
use crate::runtime::{
    Dispatcher, DispatcherPriority, Element, HandlerError, KeyBinding, KeyGesture, Point,
};

use super::config::{ClickExpectation, ElementConfig, TestScenario, TestStep, WheelDirection};

/// Result of a test run
#[derive(Debug, Serialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// What an element has received so far
#[derive(Debug, Default)]
struct ElementRecord {
    events: Vec<String>,
    position: Option<Point>,
    wheel_delta: Option<i32>,
    commands: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum FailOn {
    Any,
    Key(Key),
}

impl FailOn {
    fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("any") {
            Ok(FailOn::Any)
        } else {
            Ok(FailOn::Key(value.parse()?))
        }
    }

    fn matches(self, key: Key) -> bool {
        match self {
            FailOn::Any => true,
            FailOn::Key(k) => k == key,
        }
    }
}

type Log = Rc<RefCell<Vec<String>>>;

/// Everything a scenario's steps act on
struct Stage {
    dispatcher: Dispatcher,
    keyboard: TestKeyboard,
    mouse: TestMouse,
    elements: HashMap<String, Element>,
    records: HashMap<String, Rc<RefCell<ElementRecord>>>,
    log: Log,
    drain_priority: DispatcherPriority,
}

impl Stage {
    fn new(config: &Config) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            keyboard: TestKeyboard::new(),
            mouse: TestMouse::new(),
            elements: HashMap::new(),
            records: HashMap::new(),
            log: Rc::new(RefCell::new(Vec::new())),
            drain_priority: config.drain.sentinel_priority,
        }
    }

    fn element(&self, name: &str) -> Result<&Element> {
        self.elements
            .get(name)
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))
    }

    fn record(&self, name: &str) -> Result<&Rc<RefCell<ElementRecord>>> {
        self.records
            .get(name)
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))
    }

    fn add_element(&mut self, config: &ElementConfig) -> Result<()> {
        let element = Element::new(config.name.clone());
        element.set_offset(config.offset);
        if let Some(parent) = &config.parent {
            self.element(parent)?.add_child(&element);
        }

        let record = Rc::new(RefCell::new(ElementRecord::default()));
        let fail_on = config.fail_on.as_deref().map(FailOn::parse).transpose()?;
        let handles_keys = config.handles_keys;

        let rec = record.clone();
        element.on_key_down(move |sender, args| {
            rec.borrow_mut().events.push(format!("key_down:{}", args.key()));
            if handles_keys {
                args.set_handled(true);
            }
            match fail_on {
                Some(f) if f.matches(args.key()) => Err(HandlerError::msg(format!(
                    "{} failed on {}",
                    sender.name(),
                    args.key()
                ))),
                _ => Ok(()),
            }
        });

        let rec = record.clone();
        element.on_key_up(move |_, args| {
            rec.borrow_mut().events.push(format!("key_up:{}", args.key()));
            if handles_keys {
                args.set_handled(true);
            }
            Ok(())
        });

        let rec = record.clone();
        element.on_mouse_move(move |sender, args| {
            let mut rec = rec.borrow_mut();
            rec.events.push("mouse_move".to_string());
            rec.position = Some(args.position(sender));
            Ok(())
        });

        let rec = record.clone();
        element.on_mouse_wheel(move |_, args| {
            let mut rec = rec.borrow_mut();
            rec.events.push(format!("mouse_wheel:{}", args.delta()));
            rec.wheel_delta = Some(args.delta());
            Ok(())
        });

        for binding in &config.bindings {
            let gesture: KeyGesture = binding.gesture.parse()?;
            let rec = record.clone();
            let command = binding.command.clone();
            element.add_input_binding(KeyBinding::new(gesture, move || {
                rec.borrow_mut().commands.push(command.clone());
                Ok(())
            }));
        }

        self.elements.insert(config.name.clone(), element);
        self.records.insert(config.name.clone(), record);
        Ok(())
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        // Never leak pressed keys into the next scenario
        self.keyboard.reset();
        self.dispatcher.begin_shutdown();
    }
}

/// Load and parse a YAML scenario
pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;

    serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse test scenario: {}", e)))
}

/// Run a test scenario from a YAML file using the user's configuration
pub fn run_scenario(path: &Path, verbose: bool) -> Result<TestResult> {
    let config = Config::load()?;
    run_scenario_with(path, &config, verbose)
}

/// Run a test scenario from a YAML file with an explicit configuration
pub fn run_scenario_with(path: &Path, config: &Config, verbose: bool) -> Result<TestResult> {
    let scenario = load_scenario(path)?;
    Ok(run(&scenario, config, verbose))
}

/// Run an already-parsed scenario
pub fn run(scenario: &TestScenario, config: &Config, verbose: bool) -> TestResult {
    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    let mut stage = Stage::new(config);

    if !scenario.elements.is_empty() {
        println!("\n{}", "Setup:".cyan());
    }
    for element in &scenario.elements {
        if let Err(e) = stage.add_element(element) {
            println!("  {} {}: {}", "✗".red(), element.name, e);
            return TestResult {
                name: scenario.name.clone(),
                passed: false,
                steps_run: 0,
                steps_total,
                error: Some(format!("Setup of element '{}' failed: {}", element.name, e)),
            };
        }
        if verbose {
            println!(
                "  {} {} at {}",
                "✓".green(),
                element.name,
                element.offset.to_string().dimmed()
            );
        }
    }

    println!("\n{}", "Steps:".cyan());

    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        match execute_step(&stage, step) {
            Ok(summary) => {
                println!("  {} Step {}: {}", "✓".green(), step_num, summary.dimmed());
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
                return TestResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: step_num,
                    steps_total,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Test Passed".green().bold()
    );

    TestResult {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    }
}

/// Execute a single test step, returning a one-line summary
fn execute_step(stage: &Stage, step: &TestStep) -> Result<String> {
    match step {
        TestStep::Press { key, element } => match element {
            Some(name) => {
                stage.keyboard.press_on(stage.element(name)?, *key)?;
                Ok(format!("press {} on {}", key, name))
            }
            None => {
                stage.keyboard.press(*key);
                Ok(format!("press {}", key))
            }
        },
        TestStep::Release { key, element } => match element {
            Some(name) => {
                stage.keyboard.release_on(stage.element(name)?, *key)?;
                Ok(format!("release {} on {}", key, name))
            }
            None => {
                stage.keyboard.release(*key);
                Ok(format!("release {}", key))
            }
        },
        TestStep::Click {
            key,
            element,
            modifiers,
            expect,
        } => execute_click_step(stage, *key, element, modifiers.as_deref(), expect.as_ref()),
        TestStep::Move { element, x, y } => {
            let point = Point::new(*x, *y);
            stage.mouse.move_relative_to(stage.element(element)?, point)?;
            Ok(format!("move to {} on {}", point, element))
        }
        TestStep::Wheel {
            element,
            delta,
            direction,
        } => {
            let target = stage.element(element)?;
            match (delta, direction) {
                (Some(delta), None) => stage.mouse.rotate_mouse_wheel(target, *delta)?,
                (None, Some(WheelDirection::Up)) => stage.mouse.rotate_mouse_wheel_up(target)?,
                (None, Some(WheelDirection::Down)) => stage.mouse.rotate_mouse_wheel_down(target)?,
                _ => {
                    return Err(Error::Config(
                        "wheel step requires exactly one of 'delta' or 'direction'".to_string(),
                    ))
                }
            }
            Ok(format!("wheel on {}", element))
        }
        TestStep::Post {
            label,
            priority,
            then,
        } => {
            let priority = priority.unwrap_or_default();
            post(&stage.dispatcher, &stage.log, label.clone(), priority, then.clone());
            Ok(format!("post '{}' at {}", label, priority))
        }
        TestStep::Drain { priority } => {
            let priority = priority.unwrap_or(stage.drain_priority);
            stage.dispatcher.execute_pending_events_at(priority)?;
            Ok(format!(
                "drain to {} ({} left pending)",
                priority,
                stage.dispatcher.pending_count()
            ))
        }
        TestStep::Reset => {
            stage.keyboard.reset();
            Ok("reset keyboard".to_string())
        }
        TestStep::ExpectKeys {
            down,
            up,
            modifiers,
        } => execute_expect_keys_step(down, up, modifiers.as_deref()),
        TestStep::ExpectElement {
            element,
            events,
            position,
            wheel_delta,
            commands,
        } => {
            let record = stage.record(element)?.borrow();

            if let Some(expected) = events {
                if &record.events != expected {
                    return Err(Error::TestAssertion(format!(
                        "Element '{}': expected events {:?}, got {:?}",
                        element, expected, record.events
                    )));
                }
            }

            if let Some(expected) = position {
                if record.position != Some(*expected) {
                    return Err(Error::TestAssertion(format!(
                        "Element '{}': expected position {}, got {:?}",
                        element, expected, record.position
                    )));
                }
            }

            if let Some(expected) = wheel_delta {
                if record.wheel_delta != Some(*expected) {
                    return Err(Error::TestAssertion(format!(
                        "Element '{}': expected wheel delta {}, got {:?}",
                        element, expected, record.wheel_delta
                    )));
                }
            }

            if let Some(expected) = commands {
                if &record.commands != expected {
                    return Err(Error::TestAssertion(format!(
                        "Element '{}': expected commands {:?}, got {:?}",
                        element, expected, record.commands
                    )));
                }
            }

            Ok(format!("inspect {}", element))
        }
        TestStep::ExpectLog { equals } => {
            let log = stage.log.borrow();
            if &*log != equals {
                return Err(Error::TestAssertion(format!(
                    "Expected log {:?}, got {:?}",
                    equals, *log
                )));
            }
            Ok(format!("log has {} entries", log.len()))
        }
    }
}

/// Execute a click step
fn execute_click_step(
    stage: &Stage,
    key: Key,
    element: &str,
    modifiers: Option<&str>,
    expect: Option<&ClickExpectation>,
) -> Result<String> {
    let target = stage.element(element)?;
    let modifiers: ModifierKeys = modifiers.unwrap_or("").parse()?;

    let result = if modifiers.is_empty() {
        stage.keyboard.click(target, key)
    } else {
        stage.keyboard.click_with_modifiers(target, key, modifiers)
    };

    let gesture = KeyGesture::new(key, modifiers);
    let expect_success = expect.and_then(|e| e.success).unwrap_or(true);

    match result {
        Ok(()) if expect_success => Ok(format!("click {} on {}", gesture, element)),
        Ok(()) => Err(Error::TestAssertion(format!(
            "Click {} on '{}': expected failure but it succeeded",
            gesture, element
        ))),
        Err(e) if expect_success => Err(e),
        Err(e) => {
            if let Some(expected_substr) = expect.and_then(|e| e.error_contains.as_ref()) {
                if !e.to_string().contains(expected_substr) {
                    return Err(Error::TestAssertion(format!(
                        "Click {} on '{}': expected error containing '{}', got '{}'",
                        gesture, element, expected_substr, e
                    )));
                }
            }
            Ok(format!("click {} on {} (expected failure)", gesture, element))
        }
    }
}

/// Execute an expect keys step
fn execute_expect_keys_step(down: &[Key], up: &[Key], modifiers: Option<&str>) -> Result<String> {
    for key in down {
        if !Keyboard::is_key_down(*key) {
            return Err(Error::TestAssertion(format!("Expected {} to be down", key)));
        }
    }

    for key in up {
        if !Keyboard::is_key_up(*key) {
            return Err(Error::TestAssertion(format!("Expected {} to be up", key)));
        }
    }

    if let Some(expected) = modifiers {
        let expected: ModifierKeys = expected.parse()?;
        let actual = Keyboard::primary_device().modifiers();
        if actual != expected {
            return Err(Error::TestAssertion(format!(
                "Expected modifiers {}, got {}",
                expected, actual
            )));
        }
    }

    Ok(format!("keys ({} down, {} up checked)", down.len(), up.len()))
}

/// Queue a task that logs `label`, then queues each of `then` at the same priority
fn post(dispatcher: &Dispatcher, log: &Log, label: String, priority: DispatcherPriority, then: Vec<String>) {
    let next_dispatcher = dispatcher.clone();
    let log = log.clone();
    dispatcher.begin_invoke(priority, move || {
        log.borrow_mut().push(label);
        for next in then {
            post(&next_dispatcher, &log, next, priority, Vec::new());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> TestScenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_steps() {
        let scenario = parse(
            r#"
name: parse
elements:
  - name: root
  - name: child
    parent: root
    offset: { x: 4, y: 2 }
    fail_on: A
    bindings:
      - gesture: Ctrl+B
        command: bold
steps:
  - action: click
    element: child
    key: B
    modifiers: Ctrl
  - action: wheel
    element: child
    direction: up
  - action: post
    label: first
    priority: background
    then: [second]
  - action: drain
  - action: expect_keys
    up: [B, LeftCtrl]
    modifiers: None
"#,
        );
        assert_eq!(scenario.elements.len(), 2);
        assert_eq!(scenario.elements[1].offset, Point::new(4.0, 2.0));
        assert_eq!(scenario.steps.len(), 5);
        assert!(matches!(
            scenario.steps[0],
            TestStep::Click { key: Key::B, .. }
        ));
        assert!(matches!(
            scenario.steps[1],
            TestStep::Wheel {
                direction: Some(WheelDirection::Up),
                ..
            }
        ));
        assert!(matches!(
            scenario.steps[2],
            TestStep::Post {
                priority: Some(DispatcherPriority::Background),
                ..
            }
        ));
    }

    #[test]
    fn test_fail_on_parsing() {
        assert!(matches!(FailOn::parse("any").unwrap(), FailOn::Any));
        assert!(matches!(FailOn::parse("A").unwrap(), FailOn::Key(Key::A)));
        assert!(FailOn::parse("nope").is_err());
        assert!(FailOn::Any.matches(Key::Z));
        assert!(!FailOn::Key(Key::A).matches(Key::Z));
    }

    #[test]
    fn test_unknown_parent_fails_setup() {
        let scenario = parse(
            r#"
name: orphan
elements:
  - name: child
    parent: missing
steps: []
"#,
        );
        let result = run(&scenario, &Config::default(), false);
        assert!(!result.passed);
        assert!(result.error.unwrap().contains("missing"));
    }
}
