//! Process-wide synthetic keyboard and pointer state
//!
//! This is the single source of truth for which keys are "pressed", and
//! where the pointer is, while a test runs. It is global because the device it stands in for is global;
//! two tests that press keys at the same time will see each other's keys,
//! so tests using it must run one at a time.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, OnceLock};

use super::device::KeyboardDevice;
use super::key::{Key, ModifierKeys};
use super::mouse::MouseDevice;
use crate::runtime::{Element, Point};

/// The set of currently pressed synthetic keys
#[derive(Debug, Default)]
pub struct SyntheticKeyState {
    pressed: Mutex<BTreeSet<Key>>,
}

impl SyntheticKeyState {
    /// The process-wide instance
    pub fn global() -> &'static SyntheticKeyState {
        static STATE: OnceLock<SyntheticKeyState> = OnceLock::new();
        STATE.get_or_init(SyntheticKeyState::default)
    }

    fn keys(&self) -> MutexGuard<'_, BTreeSet<Key>> {
        // A panicking handler must not wedge every later test
        self.pressed.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Mark a key as pressed. Returns false if it already was.
    pub fn add(&self, key: Key) -> bool {
        self.keys().insert(key)
    }

    /// Mark a key as released. Returns false if it was not pressed.
    pub fn remove(&self, key: Key) -> bool {
        self.keys().remove(&key)
    }

    pub fn clear(&self) {
        self.keys().clear();
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys().contains(&key)
    }

    pub fn is_up(&self, key: Key) -> bool {
        !self.is_down(key)
    }

    /// Modifier flags whose left or right key is currently down
    pub fn current_modifiers(&self) -> ModifierKeys {
        self.keys()
            .iter()
            .fold(ModifierKeys::NONE, |acc, key| acc | key.modifier())
    }

    /// Sorted snapshot of the pressed keys
    pub fn pressed_keys(&self) -> Vec<Key> {
        self.keys().iter().copied().collect()
    }
}

impl KeyboardDevice for SyntheticKeyState {
    fn is_key_down(&self, key: Key) -> bool {
        self.is_down(key)
    }

    fn is_key_up(&self, key: Key) -> bool {
        self.is_up(key)
    }

    fn is_key_toggled(&self, _key: Key) -> bool {
        false
    }

    fn modifiers(&self) -> ModifierKeys {
        self.current_modifiers()
    }
}

/// Where the pointer was last moved to
#[derive(Debug, Clone, Copy, Default)]
struct Pointer {
    root: Point,
    /// Origin of the element the move was made against, and the point inside it
    anchor: Option<(Point, Point)>,
}

/// The synthetic pointer position
#[derive(Debug, Default)]
pub struct SyntheticMouseState {
    pointer: Mutex<Pointer>,
}

impl SyntheticMouseState {
    /// The process-wide instance
    pub fn global() -> &'static SyntheticMouseState {
        static STATE: OnceLock<SyntheticMouseState> = OnceLock::new();
        STATE.get_or_init(SyntheticMouseState::default)
    }

    fn pointer(&self) -> MutexGuard<'_, Pointer> {
        self.pointer.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Put the pointer at `position` inside `element`
    pub fn move_to(&self, element: &Element, position: Point) {
        let origin = element.origin();
        *self.pointer() = Pointer {
            root: origin + position,
            anchor: Some((origin, position)),
        };
    }

    /// Put the pointer back at the root origin
    pub fn reset(&self) {
        *self.pointer() = Pointer::default();
    }

    pub fn root_position(&self) -> Point {
        self.pointer().root
    }
}

impl MouseDevice for SyntheticMouseState {
    fn position(&self, relative_to: &Element) -> Point {
        let pointer = *self.pointer();
        let origin = relative_to.origin();
        match pointer.anchor {
            Some((anchor_origin, position)) if anchor_origin == origin => position,
            _ => pointer.root - origin,
        }
    }
}
