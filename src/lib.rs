//! UI Harness - Deterministic input testing for a dispatcher-driven UI runtime
//!
//! This library provides a synthetic keyboard and mouse, a way to drain the
//! UI dispatcher, and a YAML scenario runner built on top of them.

pub mod cli;
pub mod commands;
pub mod common;
pub mod harness;
pub mod input;
pub mod runtime;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use harness::{DispatcherExt, TestKeyboard, TestMouse, WHEEL_DELTA};
pub use input::{Key, Keyboard, KeyboardDevice, ModifierKeys, Mouse, MouseDevice};
pub use runtime::{Dispatcher, DispatcherPriority, DispatcherTimer, Element, WeakDispatcher};
