//! Synthetic mouse input
//!
//! The only persistent state is the pointer position, kept in
//! [`SyntheticMouseState`] so [`Mouse::position`](crate::input::Mouse::position)
//! answers from it. As with keys, the state changes before the notification.

use crate::common::Result;
use crate::input::{interceptor, SyntheticMouseState};
use crate::runtime::{
    tick_count, Element, InputSource, MouseEventArgs, MouseWheelEventArgs, Point, RoutedEvent,
};

/// Wheel rotation of one notch
pub const WHEEL_DELTA: i32 = 120;

/// Test double for the mouse
#[derive(Debug)]
pub struct TestMouse {
    state: &'static SyntheticMouseState,
    source: InputSource,
}

impl TestMouse {
    /// Installs the input interceptor and puts the pointer at the root origin
    pub fn new() -> Self {
        interceptor::install();
        let mouse = Self {
            state: SyntheticMouseState::global(),
            source: InputSource::synthetic(),
        };
        mouse.state.reset();
        mouse
    }

    /// Move the pointer to `position`, relative to `element`'s top-left corner
    ///
    /// Position queries for `element` return exactly `position` from then on.
    pub fn move_relative_to(&self, element: &Element, position: Point) -> Result<()> {
        tracing::debug!(element = %element.name(), %position, "Mouse move");
        self.state.move_to(element, position);
        let args = self.mouse_args(element, position);
        element.raise_event(RoutedEvent::MouseMove(args))?;
        Ok(())
    }

    /// Rotate the wheel over `element` by a signed `delta`
    ///
    /// The notification carries the current pointer position.
    pub fn rotate_mouse_wheel(&self, element: &Element, delta: i32) -> Result<()> {
        tracing::debug!(element = %element.name(), delta, "Mouse wheel");
        let mouse = MouseEventArgs::new(self.source.clone(), tick_count(), self.state.root_position());
        let args = MouseWheelEventArgs::new(mouse, delta);
        element.raise_event(RoutedEvent::MouseWheel(args))?;
        Ok(())
    }

    pub fn rotate_mouse_wheel_up(&self, element: &Element) -> Result<()> {
        self.rotate_mouse_wheel(element, WHEEL_DELTA)
    }

    pub fn rotate_mouse_wheel_down(&self, element: &Element) -> Result<()> {
        self.rotate_mouse_wheel(element, -WHEEL_DELTA)
    }

    fn mouse_args(&self, element: &Element, position: Point) -> MouseEventArgs {
        MouseEventArgs::relative_to(self.source.clone(), tick_count(), element, position)
    }
}

impl Default for TestMouse {
    fn default() -> Self {
        Self::new()
    }
}
