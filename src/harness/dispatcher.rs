//! Dispatcher extensions for tests: draining and timer introspection

use std::time::Instant;

use crate::common::{Error, Result};
use crate::runtime::{Dispatcher, DispatcherFrame, DispatcherPriority, DispatcherTimer, WeakDispatcher};

/// Test helpers available on dispatcher handles
pub trait DispatcherExt {
    /// Block until all pending work at or above `Background` priority has run
    ///
    /// Work queued above `Background` while draining runs too; work queued
    /// at `Background` during the drain, or below it at any time, is left
    /// pending.
    fn execute_pending_events(&self) -> Result<()> {
        self.execute_pending_events_at(DispatcherPriority::Background)
    }

    /// Block until all pending work at or above `priority` has run
    fn execute_pending_events_at(&self, priority: DispatcherPriority) -> Result<()>;

    /// Copy of the timers currently started on this dispatcher, in start order
    fn active_timers(&self) -> Result<Vec<DispatcherTimer>>;
}

impl DispatcherExt for Dispatcher {
    fn execute_pending_events_at(&self, priority: DispatcherPriority) -> Result<()> {
        if self.has_shutdown_started() {
            return Err(Error::invalid_dispatcher("dispatcher has shut down"));
        }

        let started = Instant::now();
        let pending = self.pending_count();

        // The queue is priority ordered and FIFO per level, so the sentinel
        // only runs once nothing at or above its priority is left.
        let frame = DispatcherFrame::new();
        let sentinel = frame.clone();
        self.begin_invoke(priority, move || sentinel.set_continue(false));
        self.push_frame(&frame)?;

        tracing::debug!(
            dispatcher = self.id(),
            %priority,
            pending,
            left_pending = self.pending_count(),
            elapsed = ?started.elapsed(),
            "Drained dispatcher"
        );
        Ok(())
    }

    fn active_timers(&self) -> Result<Vec<DispatcherTimer>> {
        if self.has_shutdown_started() {
            return Err(Error::invalid_dispatcher("dispatcher has shut down"));
        }
        Ok(self.timers().clone())
    }
}

impl DispatcherExt for WeakDispatcher {
    fn execute_pending_events_at(&self, priority: DispatcherPriority) -> Result<()> {
        live(self)?.execute_pending_events_at(priority)
    }

    fn active_timers(&self) -> Result<Vec<DispatcherTimer>> {
        live(self)?.active_timers()
    }
}

fn live(handle: &WeakDispatcher) -> Result<Dispatcher> {
    handle
        .upgrade()
        .ok_or_else(|| Error::invalid_dispatcher("dispatcher has been dropped"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn test_drain_leaves_lower_priority_work() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        dispatcher.begin_invoke(DispatcherPriority::ApplicationIdle, move || {
            sink.borrow_mut().push("idle")
        });
        let sink = log.clone();
        dispatcher.begin_invoke(DispatcherPriority::Normal, move || sink.borrow_mut().push("normal"));

        dispatcher.execute_pending_events().unwrap();
        assert_eq!(*log.borrow(), vec!["normal"]);
        assert_eq!(dispatcher.pending_at(DispatcherPriority::ApplicationIdle), 1);

        dispatcher
            .execute_pending_events_at(DispatcherPriority::ApplicationIdle)
            .unwrap();
        assert_eq!(*log.borrow(), vec!["normal", "idle"]);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let dispatcher = Dispatcher::new();
        let timer = DispatcherTimer::new(&dispatcher, Duration::from_secs(1), DispatcherPriority::Input);
        timer.start();

        let snapshot = dispatcher.active_timers().unwrap();
        timer.stop();
        assert_eq!(snapshot, vec![timer.clone()]);
        assert!(dispatcher.active_timers().unwrap().is_empty());
    }

    #[test]
    fn test_shut_down_dispatcher_is_rejected() {
        let dispatcher = Dispatcher::new();
        dispatcher.begin_shutdown();
        assert!(matches!(
            dispatcher.execute_pending_events(),
            Err(Error::InvalidDispatcher(_))
        ));
        assert!(matches!(dispatcher.active_timers(), Err(Error::InvalidDispatcher(_))));
    }
}
