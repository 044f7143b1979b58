//! Single-threaded, priority-ordered cooperative task queue
//!
//! All UI work runs through a [`Dispatcher`]. Operations are executed
//! highest priority first and FIFO within one priority level. A caller can
//! run the queue re-entrantly with [`Dispatcher::push_frame`], which keeps
//! executing operations until its [`DispatcherFrame`] is told to stop.

use std::cell::{Cell, Ref, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::timer::DispatcherTimer;
use crate::common::{Error, Result};

/// Priority levels, lowest first
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherPriority {
    ApplicationIdle,
    ContextIdle,
    Background,
    Input,
    Loaded,
    Render,
    DataBind,
    #[default]
    Normal,
    Send,
}

impl fmt::Display for DispatcherPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Operation {
    seq: u64,
    task: Box<dyn FnOnce()>,
}

pub(crate) struct DispatcherInner {
    id: u64,
    queue: RefCell<BTreeMap<DispatcherPriority, VecDeque<Operation>>>,
    timers: RefCell<Vec<DispatcherTimer>>,
    next_seq: Cell<u64>,
    frame_depth: Cell<usize>,
    shutdown: Cell<bool>,
}

/// Handle to a dispatcher; clones share the same queue
#[derive(Clone)]
pub struct Dispatcher {
    inner: Rc<DispatcherInner>,
}

/// Non-owning handle that may outlive its dispatcher
#[derive(Clone, Default)]
pub struct WeakDispatcher {
    inner: Weak<DispatcherInner>,
}

/// Keeps a nested pump running until `set_continue(false)` is called
#[derive(Clone, Debug)]
pub struct DispatcherFrame {
    keep_running: Rc<Cell<bool>>,
}

impl DispatcherFrame {
    pub fn new() -> Self {
        Self {
            keep_running: Rc::new(Cell::new(true)),
        }
    }

    pub fn should_continue(&self) -> bool {
        self.keep_running.get()
    }

    pub fn set_continue(&self, keep_running: bool) {
        self.keep_running.set(keep_running);
    }
}

impl Default for DispatcherFrame {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Dispatcher>> = const { RefCell::new(None) };
}

/// Restores the frame depth even if an operation panics
struct FrameDepthGuard<'a>(&'a Cell<usize>);

impl Drop for FrameDepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl Dispatcher {
    /// Create a dispatcher that is not the thread's current one
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            inner: Rc::new(DispatcherInner {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                queue: RefCell::new(BTreeMap::new()),
                timers: RefCell::new(Vec::new()),
                next_seq: Cell::new(0),
                frame_depth: Cell::new(0),
                shutdown: Cell::new(false),
            }),
        }
    }

    /// The calling thread's dispatcher, created on first use
    pub fn current() -> Self {
        CURRENT.with(|current| {
            let mut current = current.borrow_mut();
            if let Some(dispatcher) = current.as_ref() {
                if !dispatcher.has_shutdown_started() {
                    return dispatcher.clone();
                }
            }
            let dispatcher = Dispatcher::new();
            *current = Some(dispatcher.clone());
            dispatcher
        })
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Queue `task` to run later at `priority`
    ///
    /// Returns false, dropping the task, if the dispatcher is shutting down.
    pub fn begin_invoke(&self, priority: DispatcherPriority, task: impl FnOnce() + 'static) -> bool {
        if self.has_shutdown_started() {
            tracing::debug!(dispatcher = self.id(), "Dropping operation posted after shutdown");
            return false;
        }
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        self.inner
            .queue
            .borrow_mut()
            .entry(priority)
            .or_default()
            .push_back(Operation {
                seq,
                task: Box::new(task),
            });
        tracing::trace!(dispatcher = self.id(), %priority, seq, "Operation queued");
        true
    }

    /// Number of queued operations across all priorities
    pub fn pending_count(&self) -> usize {
        self.inner.queue.borrow().values().map(VecDeque::len).sum()
    }

    /// Number of queued operations at exactly `priority`
    pub fn pending_at(&self, priority: DispatcherPriority) -> usize {
        self.inner
            .queue
            .borrow()
            .get(&priority)
            .map_or(0, VecDeque::len)
    }

    /// How many nested frames are currently pumping
    pub fn frame_depth(&self) -> usize {
        self.inner.frame_depth.get()
    }

    /// Run queued operations until `frame` stops
    ///
    /// Re-entrant: an operation may push a frame of its own. When the queue
    /// is empty the pump waits for the next timer; with no timer pending the
    /// frame can never finish and `Error::DispatcherStalled` is returned.
    pub fn push_frame(&self, frame: &DispatcherFrame) -> Result<()> {
        if self.has_shutdown_started() {
            return Err(Error::invalid_dispatcher("dispatcher has shut down"));
        }

        self.inner.frame_depth.set(self.inner.frame_depth.get() + 1);
        let _depth = FrameDepthGuard(&self.inner.frame_depth);
        tracing::trace!(dispatcher = self.id(), depth = self.frame_depth(), "Frame pushed");

        while frame.should_continue() {
            self.enqueue_due_timers();

            if let Some(operation) = self.pop_next() {
                tracing::trace!(dispatcher = self.id(), seq = operation.seq, "Running operation");
                (operation.task)();
                continue;
            }

            match self.next_timer_due() {
                Some(due) => {
                    let now = Instant::now();
                    if due > now {
                        std::thread::sleep(due - now);
                    }
                }
                None => return Err(Error::DispatcherStalled),
            }
        }
        Ok(())
    }

    /// Stop accepting work: pending operations are dropped and timers stopped
    pub fn begin_shutdown(&self) {
        if self.inner.shutdown.replace(true) {
            return;
        }
        let dropped = self.pending_count();
        self.inner.queue.borrow_mut().clear();
        let timers: Vec<DispatcherTimer> = self.inner.timers.borrow_mut().drain(..).collect();
        for timer in &timers {
            timer.stop();
        }
        tracing::debug!(dispatcher = self.id(), dropped, "Dispatcher shut down");
    }

    pub fn has_shutdown_started(&self) -> bool {
        self.inner.shutdown.get()
    }

    /// Live view of the started timers, in start order
    pub(crate) fn timers(&self) -> Ref<'_, Vec<DispatcherTimer>> {
        self.inner.timers.borrow()
    }

    pub(crate) fn add_timer(&self, timer: &DispatcherTimer) {
        let mut timers = self.inner.timers.borrow_mut();
        if !timers.contains(timer) {
            timers.push(timer.clone());
        }
    }

    pub(crate) fn remove_timer(&self, timer: &DispatcherTimer) {
        self.inner.timers.borrow_mut().retain(|t| t != timer);
    }

    fn pop_next(&self) -> Option<Operation> {
        let mut queue = self.inner.queue.borrow_mut();
        let mut entry = queue.last_entry()?;
        let operation = entry.get_mut().pop_front();
        if entry.get().is_empty() {
            entry.remove();
        }
        operation
    }

    fn enqueue_due_timers(&self) {
        let now = Instant::now();
        let due: Vec<DispatcherTimer> = self
            .inner
            .timers
            .borrow()
            .iter()
            .filter(|timer| timer.is_due(now))
            .cloned()
            .collect();
        for timer in due {
            timer.schedule_tick(self);
        }
    }

    fn next_timer_due(&self) -> Option<Instant> {
        self.inner
            .timers
            .borrow()
            .iter()
            .filter_map(DispatcherTimer::next_due)
            .min()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Dispatcher {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Dispatcher {}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.inner.id)
            .field("pending", &self.pending_count())
            .field("frame_depth", &self.frame_depth())
            .field("shutdown", &self.has_shutdown_started())
            .finish()
    }
}

impl WeakDispatcher {
    /// A handle that never pointed at a dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade(&self) -> Option<Dispatcher> {
        self.inner.upgrade().map(|inner| Dispatcher { inner })
    }
}

impl fmt::Debug for WeakDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(dispatcher) => f.debug_tuple("WeakDispatcher").field(&dispatcher.id()).finish(),
            None => f.write_str("WeakDispatcher(<dropped>)"),
        }
    }
}
