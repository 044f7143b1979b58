//! Routed input notifications and their payloads

use std::fmt;
use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::element::Element;
use crate::input::{Key, Keyboard, PrimaryKeyboardDevice};

/// Failure raised by application code from an event handler
///
/// Carries the application's own error value untouched so callers can
/// downcast it after the harness has passed it through.
#[derive(Debug)]
pub struct HandlerError(Box<dyn std::error::Error + Send + Sync + 'static>);

/// What every event handler returns
pub type HandlerResult = std::result::Result<(), HandlerError>;

impl HandlerError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Milliseconds since the runtime was first asked for the time
pub fn tick_count() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// A 2D position in device-independent units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSourceKind {
    /// Backed by a real top-level window
    Window,
    /// Manufactured for synthetic input; no window behind it
    Synthetic,
}

/// The presentation source an input notification claims to come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    handle: u64,
    kind: InputSourceKind,
}

impl InputSource {
    /// Wrap an existing window handle
    pub fn window(handle: u64) -> Self {
        Self {
            handle,
            kind: InputSourceKind::Window,
        }
    }

    /// Manufacture a source with a fresh handle that no window owns
    pub fn synthetic() -> Self {
        static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0x5157_0000);
        Self {
            handle: NEXT_HANDLE.fetch_add(1, Ordering::Relaxed),
            kind: InputSourceKind::Synthetic,
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn kind(&self) -> InputSourceKind {
        self.kind
    }
}

/// Payload of key-down and key-up notifications
#[derive(Debug, Clone)]
pub struct KeyEventArgs {
    device: PrimaryKeyboardDevice,
    source: InputSource,
    timestamp: u64,
    key: Key,
    handled: bool,
}

impl KeyEventArgs {
    /// Build a key notification; an input source is mandatory
    pub fn new(device: PrimaryKeyboardDevice, source: InputSource, timestamp: u64, key: Key) -> Self {
        Self {
            device,
            source,
            timestamp,
            key,
            handled: false,
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn device(&self) -> PrimaryKeyboardDevice {
        self.device
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Whether the key is down right now, according to the keyboard
    pub fn is_down(&self) -> bool {
        Keyboard::is_key_down(self.key)
    }

    pub fn handled(&self) -> bool {
        self.handled
    }

    /// Stop the notification from bubbling further
    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }
}

/// Payload of mouse notifications
///
/// The pointer position is stored in root coordinates and translated per
/// element on request. Notifications built with [`MouseEventArgs::relative_to`]
/// also remember the element-relative point they were built from, so asking
/// that element for the position returns it exactly.
#[derive(Debug, Clone)]
pub struct MouseEventArgs {
    source: InputSource,
    timestamp: u64,
    root_position: Point,
    anchor: Option<(Point, Point)>,
    handled: bool,
}

impl MouseEventArgs {
    pub fn new(source: InputSource, timestamp: u64, root_position: Point) -> Self {
        Self {
            source,
            timestamp,
            root_position,
            anchor: None,
            handled: false,
        }
    }

    /// Pointer at `position` inside `element`
    pub fn relative_to(source: InputSource, timestamp: u64, element: &Element, position: Point) -> Self {
        let origin = element.origin();
        Self {
            source,
            timestamp,
            root_position: origin + position,
            anchor: Some((origin, position)),
            handled: false,
        }
    }

    /// Pointer position relative to `element`'s top-left corner
    pub fn position(&self, relative_to: &Element) -> Point {
        let origin = relative_to.origin();
        match self.anchor {
            Some((anchor_origin, position)) if anchor_origin == origin => position,
            _ => self.root_position - origin,
        }
    }

    pub fn root_position(&self) -> Point {
        self.root_position
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn handled(&self) -> bool {
        self.handled
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }
}

/// Payload of mouse wheel notifications
#[derive(Debug, Clone)]
pub struct MouseWheelEventArgs {
    mouse: MouseEventArgs,
    delta: i32,
}

impl MouseWheelEventArgs {
    pub fn new(mouse: MouseEventArgs, delta: i32) -> Self {
        Self { mouse, delta }
    }

    /// Signed rotation; positive is away from the user
    pub fn delta(&self) -> i32 {
        self.delta
    }

    pub fn position(&self, relative_to: &Element) -> Point {
        self.mouse.position(relative_to)
    }

    pub fn handled(&self) -> bool {
        self.mouse.handled()
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.mouse.set_handled(handled);
    }
}

/// A notification delivered to an element and bubbled to its ancestors
#[derive(Debug, Clone)]
pub enum RoutedEvent {
    KeyDown(KeyEventArgs),
    KeyUp(KeyEventArgs),
    MouseMove(MouseEventArgs),
    MouseWheel(MouseWheelEventArgs),
}

impl RoutedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoutedEvent::KeyDown(_) => "key_down",
            RoutedEvent::KeyUp(_) => "key_up",
            RoutedEvent::MouseMove(_) => "mouse_move",
            RoutedEvent::MouseWheel(_) => "mouse_wheel",
        }
    }

    pub fn handled(&self) -> bool {
        match self {
            RoutedEvent::KeyDown(args) | RoutedEvent::KeyUp(args) => args.handled(),
            RoutedEvent::MouseMove(args) => args.handled(),
            RoutedEvent::MouseWheel(args) => args.handled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("null reference")]
    struct NullReference;

    #[test]
    fn test_handler_error_downcast() {
        let err = HandlerError::new(NullReference);
        assert!(err.downcast_ref::<NullReference>().is_some());
        assert_eq!(err.to_string(), "null reference");

        let err = HandlerError::msg("plain message");
        assert!(err.downcast_ref::<NullReference>().is_none());
        assert_eq!(err.to_string(), "plain message");
    }

    #[test]
    fn test_into_inner_keeps_original_error() {
        let inner = HandlerError::new(NullReference).into_inner();
        assert!(inner.downcast_ref::<NullReference>().is_some());
        assert_eq!(inner.to_string(), "null reference");
    }

    #[test]
    fn test_synthetic_sources_are_distinct() {
        let a = InputSource::synthetic();
        let b = InputSource::synthetic();
        assert_ne!(a, b);
        assert_eq!(a.kind(), InputSourceKind::Synthetic);
        assert_eq!(InputSource::window(7).kind(), InputSourceKind::Window);
    }

    #[test]
    fn test_tick_count_is_monotonic() {
        let first = tick_count();
        let second = tick_count();
        assert!(second >= first);
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(50.0, 30.0) - Point::new(8.0, 6.0);
        assert_eq!(p, Point::new(42.0, 24.0));
        assert_eq!(p + Point::new(8.0, 6.0), Point::new(50.0, 30.0));
    }
}
