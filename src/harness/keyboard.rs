//! Synthetic keyboard input
//!
//! [`TestKeyboard`] drives the process-wide [`SyntheticKeyState`] and
//! raises the matching key notifications on elements.
//!
//! Delivery order is fixed: state changes first, then the notification.
//! A key-down handler therefore sees its key down, and a key-up handler
//! sees its key already up.
//!
//! Given the global nature of keyboard state, tests that use this type
//! must not run in parallel with each other.

use crate::common::Result;
use crate::input::{interceptor, Key, Keyboard, ModifierKeys, SyntheticKeyState};
use crate::runtime::{tick_count, Element, InputSource, KeyEventArgs, RoutedEvent};

/// Keys pressed on behalf of a click, released from state on drop
///
/// Only state is touched when the guard fires: it runs while a failure or
/// panic is unwinding, and no further application code should run then.
struct PressedKeys<'a> {
    state: &'a SyntheticKeyState,
    keys: Vec<Key>,
    armed: bool,
}

impl<'a> PressedKeys<'a> {
    fn new(state: &'a SyntheticKeyState, keys: Vec<Key>) -> Self {
        Self {
            state,
            keys,
            armed: true,
        }
    }

    /// Every key was released with notifications; nothing left to undo
    fn disarm(mut self) {
        self.armed = false;
    }

    /// Release every key from state, in press order
    fn release(mut self) {
        self.release_state();
        self.armed = false;
    }

    fn release_state(&self) {
        for key in &self.keys {
            self.state.remove(*key);
        }
    }
}

impl Drop for PressedKeys<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(keys = ?self.keys, "Releasing keys while unwinding");
            self.release_state();
        }
    }
}

/// Test double for the keyboard
///
/// Constructing one installs the keyboard interceptor (once per process)
/// and releases every key, so each test should create its own.
#[derive(Debug)]
pub struct TestKeyboard {
    state: &'static SyntheticKeyState,
    source: InputSource,
}

impl TestKeyboard {
    pub fn new() -> Self {
        interceptor::install();
        let keyboard = Self {
            state: SyntheticKeyState::global(),
            source: InputSource::synthetic(),
        };
        keyboard.reset();
        keyboard
    }

    /// Release every key without notifying anyone
    pub fn reset(&self) {
        self.state.clear();
        tracing::trace!("Synthetic key state reset");
    }

    /// Mark `key` as pressed without notifying anyone
    pub fn press(&self, key: Key) {
        self.state.add(key);
    }

    /// Mark `key` as released without notifying anyone
    pub fn release(&self, key: Key) {
        self.state.remove(key);
    }

    /// Keys currently held, sorted
    pub fn pressed_keys(&self) -> Vec<Key> {
        self.state.pressed_keys()
    }

    /// Press `key`, then raise key-down on `element`
    ///
    /// The key stays pressed even if a handler fails.
    pub fn press_on(&self, element: &Element, key: Key) -> Result<()> {
        self.press(key);
        tracing::debug!(element = %element.name(), %key, "Key down");
        element.raise_event(RoutedEvent::KeyDown(self.key_args(key)))?;
        Ok(())
    }

    /// Release `key`, then raise key-up on `element`
    pub fn release_on(&self, element: &Element, key: Key) -> Result<()> {
        self.release(key);
        tracing::debug!(element = %element.name(), %key, "Key up");
        element.raise_event(RoutedEvent::KeyUp(self.key_args(key)))?;
        Ok(())
    }

    /// Press and release `key` on `element`
    ///
    /// The release is delivered even when the press handler fails; the press
    /// failure is the one returned. If a handler panics, the key is released
    /// from state only.
    pub fn click(&self, element: &Element, key: Key) -> Result<()> {
        let guard = PressedKeys::new(self.state, vec![key]);
        let pressed = self.press_on(element, key);
        let released = self.release_on(element, key);
        guard.disarm();
        pressed.and(released)
    }

    /// Press `modifiers` and `key` in order, then release them in the same order
    ///
    /// Modifiers are pressed through their canonical physical keys (see
    /// [`ModifierKeys::canonical_keys`]). If any handler fails, the remaining
    /// notifications are skipped, every key involved is released from state
    /// only, and the handler's error is returned.
    pub fn click_with_modifiers(
        &self,
        element: &Element,
        key: Key,
        modifiers: ModifierKeys,
    ) -> Result<()> {
        let mut keys = modifiers.canonical_keys();
        keys.push(key);

        let guard = PressedKeys::new(self.state, keys.clone());
        let delivered = keys
            .iter()
            .try_for_each(|k| self.press_on(element, *k))
            .and_then(|()| keys.iter().try_for_each(|k| self.release_on(element, *k)));

        match delivered {
            Ok(()) => {
                guard.disarm();
                Ok(())
            }
            Err(e) => {
                tracing::debug!(element = %element.name(), %key, %modifiers, "Click failed, resetting keys");
                guard.release();
                Err(e)
            }
        }
    }

    fn key_args(&self, key: Key) -> KeyEventArgs {
        KeyEventArgs::new(Keyboard::primary_device(), self.source.clone(), tick_count(), key)
    }
}

impl Default for TestKeyboard {
    fn default() -> Self {
        Self::new()
    }
}
