//! Tests for the change notifier.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::notifier::{ChangeNotifier, SubscriptionId, TableEvent};

#[test]
fn test_handlers_run_in_registration_order() {
    let notifier = ChangeNotifier::<TableEvent>::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    for label in ["first", "second", "third"] {
        let calls = Rc::clone(&calls);
        notifier.subscribe(move |event| calls.borrow_mut().push((label, *event)));
    }

    notifier.notify(&TableEvent::MarksChanged);
    assert_eq!(
        *calls.borrow(),
        vec![
            ("first", TableEvent::MarksChanged),
            ("second", TableEvent::MarksChanged),
            ("third", TableEvent::MarksChanged),
        ]
    );
}

#[test]
fn test_unsubscribe() {
    let notifier = ChangeNotifier::<TableEvent>::new();
    let count = Rc::new(Cell::new(0));
    let counter = Rc::clone(&count);
    let id = notifier.subscribe(move |_| counter.set(counter.get() + 1));

    notifier.notify(&TableEvent::SelectionChanged);
    assert!(notifier.unsubscribe(id));
    assert!(!notifier.unsubscribe(id));
    notifier.notify(&TableEvent::SelectionChanged);

    assert_eq!(count.get(), 1);
    assert_eq!(notifier.subscriber_count(), 0);
}

#[test]
fn test_handler_removed_during_dispatch_does_not_receive_event() {
    let notifier = ChangeNotifier::<TableEvent>::new();
    let later_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
    let later_calls = Rc::new(Cell::new(0));

    let handle = notifier.clone();
    let target = Rc::clone(&later_id);
    notifier.subscribe(move |_| {
        if let Some(id) = target.get() {
            handle.unsubscribe(id);
        }
    });
    let counter = Rc::clone(&later_calls);
    later_id.set(Some(notifier.subscribe(move |_| counter.set(counter.get() + 1))));

    notifier.notify(&TableEvent::DataChanged { row: Some(3) });
    assert_eq!(later_calls.get(), 0);
    assert_eq!(notifier.subscriber_count(), 1);
}

#[test]
fn test_handler_can_unsubscribe_itself() {
    let notifier = ChangeNotifier::<TableEvent>::new();
    let own_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
    let calls = Rc::new(Cell::new(0));

    let handle = notifier.clone();
    let id_slot = Rc::clone(&own_id);
    let counter = Rc::clone(&calls);
    own_id.set(Some(notifier.subscribe(move |_| {
        counter.set(counter.get() + 1);
        if let Some(id) = id_slot.get() {
            handle.unsubscribe(id);
        }
    })));

    notifier.notify(&TableEvent::MarksChanged);
    notifier.notify(&TableEvent::MarksChanged);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_handler_subscribed_during_dispatch_waits_for_next_event() {
    let notifier = ChangeNotifier::<TableEvent>::new();
    let late_calls = Rc::new(Cell::new(0));
    let subscribed = Rc::new(Cell::new(false));

    let handle = notifier.clone();
    let counter = Rc::clone(&late_calls);
    let done = Rc::clone(&subscribed);
    notifier.subscribe(move |_| {
        if !done.get() {
            done.set(true);
            let counter = Rc::clone(&counter);
            handle.subscribe(move |_| counter.set(counter.get() + 1));
        }
    });

    notifier.notify(&TableEvent::SelectionChanged);
    assert_eq!(late_calls.get(), 0);
    notifier.notify(&TableEvent::SelectionChanged);
    assert_eq!(late_calls.get(), 1);
}

#[test]
fn test_reentrant_notify_is_skipped_for_busy_handler() {
    let notifier = ChangeNotifier::<u32>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let handle = notifier.clone();
    let log = Rc::clone(&seen);
    notifier.subscribe(move |value: &u32| {
        log.borrow_mut().push(*value);
        if *value == 1 {
            handle.notify(&2);
        }
    });

    notifier.notify(&1);
    assert_eq!(*seen.borrow(), vec![1]);
}
