//! Keyboard query surface
//!
//! Application code asks "is this key down?" either through the global
//! [`Keyboard`] facade or through a device instance
//! ([`Keyboard::primary_device`]). Both surfaces resolve through
//! [`with_device`], which is the one place the interceptor hooks in.

use std::sync::{Arc, RwLock};

use super::interceptor;
use super::key::{Key, ModifierKeys};
use super::synthetic::SyntheticKeyState;

/// Read-only keyboard state, as seen by application code
pub trait KeyboardDevice {
    fn is_key_down(&self, key: Key) -> bool;

    fn is_key_up(&self, key: Key) -> bool {
        !self.is_key_down(key)
    }

    fn is_key_toggled(&self, key: Key) -> bool;

    fn modifiers(&self) -> ModifierKeys;
}

/// A keyboard with no hardware attached: nothing is ever down
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedKeyboard;

impl KeyboardDevice for DetachedKeyboard {
    fn is_key_down(&self, _key: Key) -> bool {
        false
    }

    fn is_key_toggled(&self, _key: Key) -> bool {
        false
    }

    fn modifiers(&self) -> ModifierKeys {
        ModifierKeys::NONE
    }
}

type SharedDevice = Arc<dyn KeyboardDevice + Send + Sync>;

/// Host-provided device used until the interceptor is installed
static BACKEND: RwLock<Option<SharedDevice>> = RwLock::new(None);

/// Replace the host keyboard backend
///
/// Has no visible effect once the interceptor is installed, since every
/// query is answered from synthetic state from then on.
pub fn set_backend(device: SharedDevice) {
    let mut backend = BACKEND.write().unwrap_or_else(|err| err.into_inner());
    *backend = Some(device);
}

/// Run `f` against whichever device currently answers keyboard queries
fn with_device<R>(f: impl FnOnce(&dyn KeyboardDevice) -> R) -> R {
    if interceptor::is_installed() {
        return f(SyntheticKeyState::global());
    }
    let backend = BACKEND.read().unwrap_or_else(|err| err.into_inner());
    match backend.as_deref() {
        Some(device) => f(device),
        None => f(&DetachedKeyboard),
    }
}

/// Global keyboard facade
pub struct Keyboard;

impl Keyboard {
    pub fn is_key_down(key: Key) -> bool {
        with_device(|d| d.is_key_down(key))
    }

    pub fn is_key_up(key: Key) -> bool {
        with_device(|d| d.is_key_up(key))
    }

    pub fn is_key_toggled(key: Key) -> bool {
        with_device(|d| d.is_key_toggled(key))
    }

    pub fn modifiers() -> ModifierKeys {
        with_device(|d| d.modifiers())
    }

    /// The device instance that input notifications report as their source
    pub fn primary_device() -> PrimaryKeyboardDevice {
        PrimaryKeyboardDevice
    }
}

/// Handle to the primary keyboard device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKeyboardDevice;

impl KeyboardDevice for PrimaryKeyboardDevice {
    fn is_key_down(&self, key: Key) -> bool {
        with_device(|d| d.is_key_down(key))
    }

    fn is_key_up(&self, key: Key) -> bool {
        with_device(|d| d.is_key_up(key))
    }

    fn is_key_toggled(&self, key: Key) -> bool {
        with_device(|d| d.is_key_toggled(key))
    }

    fn modifiers(&self) -> ModifierKeys {
        with_device(|d| d.modifiers())
    }
}
