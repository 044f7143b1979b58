//! Recurring timers owned by a dispatcher
//!
//! A started timer is tracked by its dispatcher until stopped. When it
//! comes due, the pump queues a tick at the timer's priority.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::dispatcher::{Dispatcher, DispatcherPriority, WeakDispatcher};

type TickHandler = Rc<dyn Fn(&DispatcherTimer)>;

struct TimerInner {
    id: u64,
    interval: Cell<Duration>,
    priority: DispatcherPriority,
    dispatcher: WeakDispatcher,
    tick: RefCell<Option<TickHandler>>,
    enabled: Cell<bool>,
    due: Cell<Option<Instant>>,
    tick_queued: Cell<bool>,
}

/// Handle to a recurring timer; clones refer to the same timer
#[derive(Clone)]
pub struct DispatcherTimer {
    inner: Rc<TimerInner>,
}

impl DispatcherTimer {
    pub fn new(dispatcher: &Dispatcher, interval: Duration, priority: DispatcherPriority) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            inner: Rc::new(TimerInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                interval: Cell::new(interval),
                priority,
                dispatcher: dispatcher.downgrade(),
                tick: RefCell::new(None),
                enabled: Cell::new(false),
                due: Cell::new(None),
                tick_queued: Cell::new(false),
            }),
        }
    }

    /// Timer with a tick handler already attached
    pub fn with_tick(
        dispatcher: &Dispatcher,
        interval: Duration,
        priority: DispatcherPriority,
        tick: impl Fn(&DispatcherTimer) + 'static,
    ) -> Self {
        let timer = Self::new(dispatcher, interval, priority);
        timer.on_tick(tick);
        timer
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval.get()
    }

    pub fn set_interval(&self, interval: Duration) {
        self.inner.interval.set(interval);
        if self.is_enabled() {
            self.inner.due.set(Some(Instant::now() + interval));
        }
    }

    pub fn priority(&self) -> DispatcherPriority {
        self.inner.priority
    }

    pub fn on_tick(&self, tick: impl Fn(&DispatcherTimer) + 'static) {
        *self.inner.tick.borrow_mut() = Some(Rc::new(tick));
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Start (or restart) the timer; the first tick is one interval away
    pub fn start(&self) {
        let Some(dispatcher) = self.inner.dispatcher.upgrade() else {
            tracing::warn!(timer = self.id(), "Timer started after its dispatcher was dropped");
            return;
        };
        if dispatcher.has_shutdown_started() {
            return;
        }
        self.inner.enabled.set(true);
        self.inner.due.set(Some(Instant::now() + self.interval()));
        dispatcher.add_timer(self);
        tracing::debug!(timer = self.id(), dispatcher = dispatcher.id(), "Timer started");
    }

    pub fn stop(&self) {
        self.inner.enabled.set(false);
        self.inner.due.set(None);
        if let Some(dispatcher) = self.inner.dispatcher.upgrade() {
            dispatcher.remove_timer(self);
            tracing::debug!(timer = self.id(), dispatcher = dispatcher.id(), "Timer stopped");
        }
    }

    pub(crate) fn is_due(&self, now: Instant) -> bool {
        self.next_due().is_some_and(|due| due <= now)
    }

    /// When the next tick should be queued, if one is not already queued
    pub(crate) fn next_due(&self) -> Option<Instant> {
        if !self.is_enabled() || self.inner.tick_queued.get() {
            return None;
        }
        self.inner.due.get()
    }

    pub(crate) fn schedule_tick(&self, dispatcher: &Dispatcher) {
        self.inner.tick_queued.set(true);
        let timer: Weak<TimerInner> = Rc::downgrade(&self.inner);
        dispatcher.begin_invoke(self.priority(), move || {
            if let Some(inner) = timer.upgrade() {
                DispatcherTimer { inner }.fire();
            }
        });
    }

    fn fire(&self) {
        self.inner.tick_queued.set(false);
        if !self.is_enabled() {
            return;
        }
        self.inner.due.set(Some(Instant::now() + self.interval()));
        let tick = self.inner.tick.borrow().clone();
        if let Some(tick) = tick {
            tick(self);
        }
    }
}

impl PartialEq for DispatcherTimer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for DispatcherTimer {}

impl fmt::Debug for DispatcherTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherTimer")
            .field("id", &self.inner.id)
            .field("interval", &self.interval())
            .field("priority", &self.inner.priority)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
