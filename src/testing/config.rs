//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;

use crate::input::Key;
use crate::runtime::{DispatcherPriority, Point};

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// Elements to build before the first step, parents before children
    #[serde(default)]
    pub elements: Vec<ElementConfig>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

/// An element in the scenario's element tree
///
/// Every element records the notifications it receives so later steps can
/// assert on them.
#[derive(Deserialize, Debug)]
pub struct ElementConfig {
    /// Name used by steps to refer to this element
    pub name: String,
    /// Name of an element declared earlier
    pub parent: Option<String>,
    /// Position inside the parent
    #[serde(default)]
    pub offset: Point,
    /// Make the key-down handler fail for this key ("any" for every key)
    pub fail_on: Option<String>,
    /// Mark key notifications as handled so they stop bubbling here
    #[serde(default)]
    pub handles_keys: bool,
    /// Gesture bindings whose command name is recorded when triggered
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

/// A key binding on an element
#[derive(Deserialize, Debug)]
pub struct BindingConfig {
    /// Gesture such as "Ctrl+B"
    pub gesture: String,
    /// Command name recorded when the gesture fires
    pub command: String,
}

/// Wheel direction shorthand for one notch
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WheelDirection {
    Up,
    Down,
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Press a key; notify `element` if given, otherwise state only
    Press { key: Key, element: Option<String> },
    /// Release a key; notify `element` if given, otherwise state only
    Release { key: Key, element: Option<String> },
    /// Press and release a key on an element, optionally with modifiers
    Click {
        key: Key,
        element: String,
        /// Modifier combination such as "Ctrl+Shift"
        modifiers: Option<String>,
        /// Expectations for the click result
        expect: Option<ClickExpectation>,
    },
    /// Move the mouse to a point relative to an element
    Move { element: String, x: f64, y: f64 },
    /// Rotate the mouse wheel over an element
    Wheel {
        element: String,
        /// Signed delta
        delta: Option<i32>,
        /// One notch up or down
        direction: Option<WheelDirection>,
    },
    /// Queue a task that appends `label` to the scenario log
    Post {
        label: String,
        /// Priority to queue at (default: normal)
        priority: Option<DispatcherPriority>,
        /// Labels the task queues, at the same priority, when it runs
        #[serde(default)]
        then: Vec<String>,
    },
    /// Run pending dispatcher work
    Drain {
        /// Sentinel priority (default: from config)
        priority: Option<DispatcherPriority>,
    },
    /// Release every key
    Reset,
    /// Check keyboard state through the intercepted query surface
    ExpectKeys {
        #[serde(default)]
        down: Vec<Key>,
        #[serde(default)]
        up: Vec<Key>,
        /// Exact modifier state, e.g. "Ctrl+Shift" or "None"
        modifiers: Option<String>,
    },
    /// Check what an element has received
    ExpectElement {
        element: String,
        /// Exact sequence of recorded notifications
        events: Option<Vec<String>>,
        /// Last pointer position seen by a mouse move
        position: Option<Point>,
        /// Last wheel delta seen
        wheel_delta: Option<i32>,
        /// Exact sequence of commands run by key bindings
        commands: Option<Vec<String>>,
    },
    /// Check the labels logged by posted tasks
    ExpectLog { equals: Vec<String> },
}

/// Expectations for a click
#[derive(Deserialize, Debug)]
pub struct ClickExpectation {
    /// Whether the click should succeed (default: true)
    pub success: Option<bool>,
    /// Substring expected in the failure message
    pub error_contains: Option<String>,
}
