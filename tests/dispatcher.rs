//! Dispatcher draining and timer introspection tests

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use ui_harness::common::logging;
use ui_harness::runtime::DispatcherFrame;
use ui_harness::{Dispatcher, DispatcherExt, DispatcherPriority, DispatcherTimer, Error, WeakDispatcher};

type Log = Rc<RefCell<Vec<String>>>;

fn setup() -> (Dispatcher, Log) {
    logging::init_test();
    (Dispatcher::new(), Rc::new(RefCell::new(Vec::new())))
}

fn post(dispatcher: &Dispatcher, log: &Log, priority: DispatcherPriority, label: &str) {
    let log = log.clone();
    let label = label.to_string();
    assert!(dispatcher.begin_invoke(priority, move || log.borrow_mut().push(label)));
}

#[test]
fn test_dropped_dispatcher_is_invalid() {
    logging::init_test();
    let weak = Dispatcher::new().downgrade();

    assert!(matches!(weak.execute_pending_events(), Err(Error::InvalidDispatcher(_))));
    assert!(matches!(weak.active_timers(), Err(Error::InvalidDispatcher(_))));
    assert!(matches!(
        WeakDispatcher::new().execute_pending_events(),
        Err(Error::InvalidDispatcher(_))
    ));
}

#[test]
fn test_live_weak_handle_drains() {
    let (dispatcher, log) = setup();
    post(&dispatcher, &log, DispatcherPriority::Normal, "work");

    dispatcher.downgrade().execute_pending_events().unwrap();
    assert_eq!(*log.borrow(), vec!["work"]);
}

#[test]
fn test_empty_drain_returns_promptly() {
    let (dispatcher, _) = setup();
    let started = Instant::now();

    dispatcher.execute_pending_events().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(dispatcher.pending_count(), 0);
    assert_eq!(dispatcher.frame_depth(), 0);
}

#[test]
fn test_drain_runs_single_post() {
    let (dispatcher, log) = setup();
    post(&dispatcher, &log, DispatcherPriority::Normal, "only");

    assert!(log.borrow().is_empty());
    dispatcher.execute_pending_events().unwrap();
    assert_eq!(*log.borrow(), vec!["only"]);
}

#[test]
fn test_drain_runs_multiple_posts_in_order() {
    let (dispatcher, log) = setup();
    for label in ["one", "two", "three"] {
        post(&dispatcher, &log, DispatcherPriority::Normal, label);
    }

    dispatcher.execute_pending_events().unwrap();
    assert_eq!(*log.borrow(), vec!["one", "two", "three"]);
}

#[test]
fn test_drain_runs_work_posted_while_draining() {
    let (dispatcher, log) = setup();

    let inner_dispatcher = dispatcher.clone();
    let inner_log = log.clone();
    dispatcher.begin_invoke(DispatcherPriority::Normal, move || {
        inner_log.borrow_mut().push("outer".to_string());
        post(&inner_dispatcher, &inner_log, DispatcherPriority::Normal, "nested");
        post(&inner_dispatcher, &inner_log, DispatcherPriority::Input, "input");
    });

    dispatcher.execute_pending_events().unwrap();
    assert_eq!(*log.borrow(), vec!["outer", "nested", "input"]);
}

#[test]
fn test_higher_priority_runs_first_fifo_within_level() {
    let (dispatcher, log) = setup();
    post(&dispatcher, &log, DispatcherPriority::Background, "background");
    post(&dispatcher, &log, DispatcherPriority::Normal, "normal-1");
    post(&dispatcher, &log, DispatcherPriority::Send, "send");
    post(&dispatcher, &log, DispatcherPriority::Normal, "normal-2");
    post(&dispatcher, &log, DispatcherPriority::Input, "input");

    dispatcher.execute_pending_events().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["send", "normal-1", "normal-2", "input", "background"]
    );
}

#[test]
fn test_work_below_sentinel_stays_pending() {
    let (dispatcher, log) = setup();
    post(&dispatcher, &log, DispatcherPriority::ContextIdle, "idle");
    post(&dispatcher, &log, DispatcherPriority::Normal, "normal");

    dispatcher.execute_pending_events().unwrap();
    assert_eq!(*log.borrow(), vec!["normal"]);
    assert_eq!(dispatcher.pending_at(DispatcherPriority::ContextIdle), 1);

    dispatcher
        .execute_pending_events_at(DispatcherPriority::ApplicationIdle)
        .unwrap();
    assert_eq!(*log.borrow(), vec!["normal", "idle"]);
}

#[test]
fn test_drain_from_inside_a_task() {
    let (dispatcher, log) = setup();

    let inner_dispatcher = dispatcher.clone();
    let inner_log = log.clone();
    dispatcher.begin_invoke(DispatcherPriority::Normal, move || {
        post(&inner_dispatcher, &inner_log, DispatcherPriority::Normal, "inner");
        inner_dispatcher.execute_pending_events().unwrap();
        inner_log.borrow_mut().push(format!("depth {}", inner_dispatcher.frame_depth()));
    });

    dispatcher.execute_pending_events().unwrap();
    assert_eq!(*log.borrow(), vec!["inner", "depth 1"]);
    assert_eq!(dispatcher.frame_depth(), 0);
}

#[test]
fn test_shut_down_dispatcher_rejects_drain() {
    let (dispatcher, log) = setup();
    post(&dispatcher, &log, DispatcherPriority::Normal, "dropped");
    dispatcher.begin_shutdown();

    assert!(matches!(
        dispatcher.execute_pending_events(),
        Err(Error::InvalidDispatcher(_))
    ));
    assert!(!dispatcher.begin_invoke(DispatcherPriority::Normal, || {}));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_frame_without_work_or_timers_stalls() {
    let (dispatcher, _) = setup();
    let frame = DispatcherFrame::new();

    assert!(matches!(dispatcher.push_frame(&frame), Err(Error::DispatcherStalled)));
    assert_eq!(dispatcher.frame_depth(), 0);
}

#[test]
fn test_no_timers_gives_empty_snapshot() {
    let (dispatcher, _) = setup();
    assert!(dispatcher.active_timers().unwrap().is_empty());
}

#[test]
fn test_started_timers_appear_in_start_order() {
    let (dispatcher, _) = setup();
    let first = DispatcherTimer::new(&dispatcher, Duration::from_secs(5), DispatcherPriority::Normal);
    let second = DispatcherTimer::new(&dispatcher, Duration::from_secs(5), DispatcherPriority::Input);
    let idle = DispatcherTimer::new(&dispatcher, Duration::from_secs(5), DispatcherPriority::Background);

    first.start();
    assert_eq!(dispatcher.active_timers().unwrap(), vec![first.clone()]);

    second.start();
    let snapshot = dispatcher.active_timers().unwrap();
    assert_eq!(snapshot, vec![first.clone(), second.clone()]);
    assert!(!snapshot.contains(&idle));

    first.stop();
    assert_eq!(dispatcher.active_timers().unwrap(), vec![second.clone()]);
    assert_eq!(snapshot.len(), 2, "earlier snapshot is unaffected");

    second.stop();
    assert!(dispatcher.active_timers().unwrap().is_empty());
}

#[test]
fn test_timer_tick_ends_frame() {
    let (dispatcher, _) = setup();
    let frame = DispatcherFrame::new();
    let ticks = Rc::new(RefCell::new(0));

    let stop = frame.clone();
    let count = ticks.clone();
    let timer = DispatcherTimer::with_tick(
        &dispatcher,
        Duration::from_millis(5),
        DispatcherPriority::Normal,
        move |timer| {
            *count.borrow_mut() += 1;
            timer.stop();
            stop.set_continue(false);
        },
    );
    timer.start();

    dispatcher.push_frame(&frame).unwrap();
    assert_eq!(*ticks.borrow(), 1);
    assert!(!timer.is_enabled());
    assert!(dispatcher.active_timers().unwrap().is_empty());
}
