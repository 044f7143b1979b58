//! Mouse query surface
//!
//! Mirrors the keyboard side: application code asks [`Mouse::position`] or
//! a [`MouseDevice`] for the pointer, and once the interceptor is installed
//! the answer comes from [`SyntheticMouseState`].

use super::interceptor;
use super::synthetic::SyntheticMouseState;
use crate::runtime::{Element, Point};

/// Read-only pointer state, as seen by application code
pub trait MouseDevice {
    /// Pointer position relative to `relative_to`'s top-left corner
    fn position(&self, relative_to: &Element) -> Point;
}

/// A mouse with no hardware attached: the pointer sits at the root origin
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedMouse;

impl MouseDevice for DetachedMouse {
    fn position(&self, relative_to: &Element) -> Point {
        Point::default() - relative_to.origin()
    }
}

fn with_mouse<R>(f: impl FnOnce(&dyn MouseDevice) -> R) -> R {
    if interceptor::is_installed() {
        f(SyntheticMouseState::global())
    } else {
        f(&DetachedMouse)
    }
}

/// Global mouse facade
pub struct Mouse;

impl Mouse {
    pub fn position(relative_to: &Element) -> Point {
        with_mouse(|d| d.position(relative_to))
    }

    /// The device instance mouse notifications come from
    pub fn primary_device() -> PrimaryMouseDevice {
        PrimaryMouseDevice
    }
}

/// Handle to the primary mouse device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryMouseDevice;

impl MouseDevice for PrimaryMouseDevice {
    fn position(&self, relative_to: &Element) -> Point {
        with_mouse(|d| d.position(relative_to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_mouse_sits_at_root_origin() {
        let element = Element::new("panel");
        element.set_offset(Point::new(3.0, 4.0));
        assert_eq!(DetachedMouse.position(&element), Point::new(-3.0, -4.0));
    }
}
