//! Minimal host UI runtime
//!
//! The pieces of an event-driven UI toolkit the harness drives: a
//! cooperative dispatcher with timers, an element tree with bubbling input
//! notifications, and the notification payloads themselves. Everything here
//! is single-threaded (`Rc` based) and tied to the thread that created it.

pub mod dispatcher;
pub mod element;
pub mod events;
pub mod timer;

pub use dispatcher::{Dispatcher, DispatcherFrame, DispatcherPriority, WeakDispatcher};
pub use element::{Element, KeyBinding, KeyGesture};
pub use events::{
    tick_count, HandlerError, HandlerResult, InputSource, InputSourceKind, KeyEventArgs,
    MouseEventArgs, MouseWheelEventArgs, Point, RoutedEvent,
};
pub use timer::DispatcherTimer;
