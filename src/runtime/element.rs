//! UI elements: handler registration and bubbling delivery

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use super::events::{
    HandlerResult, KeyEventArgs, MouseEventArgs, MouseWheelEventArgs, Point, RoutedEvent,
};
use crate::common::Error;
use crate::input::{Key, Keyboard, ModifierKeys};

type KeyHandler = Rc<dyn Fn(&Element, &mut KeyEventArgs) -> HandlerResult>;
type MouseHandler = Rc<dyn Fn(&Element, &mut MouseEventArgs) -> HandlerResult>;
type WheelHandler = Rc<dyn Fn(&Element, &mut MouseWheelEventArgs) -> HandlerResult>;
type Command = Rc<dyn Fn() -> HandlerResult>;

/// A key plus the exact modifier state that must be held with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyGesture {
    pub key: Key,
    pub modifiers: ModifierKeys,
}

impl KeyGesture {
    pub fn new(key: Key, modifiers: ModifierKeys) -> Self {
        Self { key, modifiers }
    }

    /// True when `args` is this key and the keyboard reports exactly these modifiers
    pub fn matches(&self, args: &KeyEventArgs) -> bool {
        args.key() == self.key && Keyboard::modifiers() == self.modifiers
    }
}

impl fmt::Display for KeyGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

impl FromStr for KeyGesture {
    type Err = Error;

    /// Parse `Ctrl+Shift+B`: the last segment is the key, the rest are modifiers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (modifiers, key) = match s.rsplit_once('+') {
            Some((modifiers, key)) => (modifiers, key),
            None => ("", s),
        };
        if key.trim().is_empty() {
            return Err(Error::InvalidGesture(s.to_string()));
        }
        Ok(Self {
            key: key.parse()?,
            modifiers: modifiers.parse()?,
        })
    }
}

/// Runs a command when its gesture is pressed on the element or a descendant
#[derive(Clone)]
pub struct KeyBinding {
    gesture: KeyGesture,
    command: Command,
}

impl KeyBinding {
    pub fn new(gesture: KeyGesture, command: impl Fn() -> HandlerResult + 'static) -> Self {
        Self {
            gesture,
            command: Rc::new(command),
        }
    }

    pub fn gesture(&self) -> KeyGesture {
        self.gesture
    }
}

impl fmt::Debug for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding")
            .field("gesture", &self.gesture)
            .finish_non_exhaustive()
    }
}

struct ElementInner {
    name: String,
    offset: Cell<Point>,
    parent: RefCell<Weak<ElementInner>>,
    key_down: RefCell<Vec<KeyHandler>>,
    key_up: RefCell<Vec<KeyHandler>>,
    mouse_move: RefCell<Vec<MouseHandler>>,
    mouse_wheel: RefCell<Vec<WheelHandler>>,
    bindings: RefCell<Vec<KeyBinding>>,
}

/// A node in the element tree
///
/// Cloning yields another handle to the same element.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                name: name.into(),
                offset: Cell::new(Point::default()),
                parent: RefCell::new(Weak::new()),
                key_down: RefCell::new(Vec::new()),
                key_up: RefCell::new(Vec::new()),
                mouse_move: RefCell::new(Vec::new()),
                mouse_wheel: RefCell::new(Vec::new()),
                bindings: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Position of this element's top-left corner inside its parent
    pub fn offset(&self) -> Point {
        self.inner.offset.get()
    }

    pub fn set_offset(&self, offset: Point) {
        self.inner.offset.set(offset);
    }

    /// Position of this element's top-left corner in root coordinates
    pub fn origin(&self) -> Point {
        let mut origin = self.offset();
        let mut next = self.parent();
        while let Some(ancestor) = next {
            origin = origin + ancestor.offset();
            next = ancestor.parent();
        }
        origin
    }

    pub fn parent(&self) -> Option<Element> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Element { inner })
    }

    /// Attach `child` under this element; notifications bubble from child to parent
    pub fn add_child(&self, child: &Element) {
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
    }

    pub fn on_key_down(&self, handler: impl Fn(&Element, &mut KeyEventArgs) -> HandlerResult + 'static) {
        self.inner.key_down.borrow_mut().push(Rc::new(handler));
    }

    pub fn on_key_up(&self, handler: impl Fn(&Element, &mut KeyEventArgs) -> HandlerResult + 'static) {
        self.inner.key_up.borrow_mut().push(Rc::new(handler));
    }

    pub fn on_mouse_move(
        &self,
        handler: impl Fn(&Element, &mut MouseEventArgs) -> HandlerResult + 'static,
    ) {
        self.inner.mouse_move.borrow_mut().push(Rc::new(handler));
    }

    pub fn on_mouse_wheel(
        &self,
        handler: impl Fn(&Element, &mut MouseWheelEventArgs) -> HandlerResult + 'static,
    ) {
        self.inner.mouse_wheel.borrow_mut().push(Rc::new(handler));
    }

    pub fn add_input_binding(&self, binding: KeyBinding) {
        self.inner.bindings.borrow_mut().push(binding);
    }

    /// Deliver `event` to this element, then to each ancestor until handled
    ///
    /// Handlers run synchronously on the caller's stack. The first handler
    /// failure stops delivery and is returned unchanged.
    pub fn raise_event(&self, mut event: RoutedEvent) -> HandlerResult {
        tracing::trace!(element = %self.name(), event = event.name(), "Raising event");

        let mut target = Some(self.clone());
        while let Some(element) = target {
            element.deliver(&mut event)?;
            if event.handled() {
                break;
            }
            target = element.parent();
        }
        Ok(())
    }

    fn deliver(&self, event: &mut RoutedEvent) -> HandlerResult {
        // Handlers may register more handlers; never hold a borrow across a call
        match event {
            RoutedEvent::KeyDown(args) => {
                let handlers = self.inner.key_down.borrow().clone();
                for handler in handlers {
                    handler(self, args)?;
                }
                if !args.handled() {
                    self.run_bindings(args)?;
                }
            }
            RoutedEvent::KeyUp(args) => {
                let handlers = self.inner.key_up.borrow().clone();
                for handler in handlers {
                    handler(self, args)?;
                }
            }
            RoutedEvent::MouseMove(args) => {
                let handlers = self.inner.mouse_move.borrow().clone();
                for handler in handlers {
                    handler(self, args)?;
                }
            }
            RoutedEvent::MouseWheel(args) => {
                let handlers = self.inner.mouse_wheel.borrow().clone();
                for handler in handlers {
                    handler(self, args)?;
                }
            }
        }
        Ok(())
    }

    fn run_bindings(&self, args: &mut KeyEventArgs) -> HandlerResult {
        let bindings = self.inner.bindings.borrow().clone();
        if let Some(binding) = bindings.iter().find(|b| b.gesture.matches(args)) {
            tracing::debug!(element = %self.name(), gesture = %binding.gesture, "Key binding matched");
            args.set_handled(true);
            (binding.command)()?;
        }
        Ok(())
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.inner.name)
            .field("offset", &self.offset())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::events::{tick_count, HandlerError, InputSource};

    fn mouse_at(x: f64, y: f64) -> MouseEventArgs {
        MouseEventArgs::new(InputSource::synthetic(), tick_count(), Point::new(x, y))
    }

    #[test]
    fn test_origin_accumulates_parent_offsets() {
        let root = Element::new("root");
        let panel = Element::new("panel");
        let button = Element::new("button");
        root.add_child(&panel);
        panel.add_child(&button);
        panel.set_offset(Point::new(10.0, 20.0));
        button.set_offset(Point::new(1.0, 2.0));

        assert_eq!(button.origin(), Point::new(11.0, 22.0));
        assert_eq!(mouse_at(53.0, 46.0).position(&button), Point::new(42.0, 24.0));
    }

    #[test]
    fn test_events_bubble_until_handled() {
        let root = Element::new("root");
        let child = Element::new("child");
        root.add_child(&child);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        root.on_mouse_move(move |sender, _| {
            log.borrow_mut().push(sender.name().to_string());
            Ok(())
        });
        let log = seen.clone();
        child.on_mouse_move(move |sender, _| {
            log.borrow_mut().push(sender.name().to_string());
            Ok(())
        });

        child.raise_event(RoutedEvent::MouseMove(mouse_at(0.0, 0.0))).unwrap();
        assert_eq!(*seen.borrow(), vec!["child", "root"]);

        seen.borrow_mut().clear();
        child.on_mouse_move(|_, args| {
            args.set_handled(true);
            Ok(())
        });
        child.raise_event(RoutedEvent::MouseMove(mouse_at(0.0, 0.0))).unwrap();
        assert_eq!(*seen.borrow(), vec!["child"]);
    }

    #[test]
    fn test_handler_failure_stops_delivery() {
        let root = Element::new("root");
        let child = Element::new("child");
        root.add_child(&child);

        let reached_root = Rc::new(Cell::new(false));
        let flag = reached_root.clone();
        root.on_mouse_wheel(move |_, _| {
            flag.set(true);
            Ok(())
        });
        child.on_mouse_wheel(|_, _| Err(HandlerError::msg("broken control")));

        let args = MouseWheelEventArgs::new(mouse_at(0.0, 0.0), 120);
        let err = child.raise_event(RoutedEvent::MouseWheel(args)).unwrap_err();
        assert_eq!(err.to_string(), "broken control");
        assert!(!reached_root.get());
    }

    #[test]
    fn test_parse_gesture() {
        let gesture: KeyGesture = "Ctrl+Shift+B".parse().unwrap();
        assert_eq!(gesture.key, Key::B);
        assert_eq!(gesture.modifiers, ModifierKeys::CONTROL | ModifierKeys::SHIFT);
        assert_eq!(gesture.to_string(), "Ctrl+Shift+B");

        let gesture: KeyGesture = "F5".parse().unwrap();
        assert_eq!(gesture, KeyGesture::new(Key::F5, ModifierKeys::NONE));

        assert!("Ctrl+".parse::<KeyGesture>().is_err());
        assert!("Hyper+B".parse::<KeyGesture>().is_err());
    }
}
