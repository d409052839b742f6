//! Observer registry used by the table model to tell the presentation layer what changed.
//!
//! Handlers run synchronously, in registration order, on the thread that owns the model.
//! The registry is `Rc`-based and therefore `!Send`, which keeps it on that thread.

use std::cell::RefCell;
use std::rc::Rc;

/// Change notifications emitted by [`EntryTableModel`](crate::EntryTableModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    /// The focused row changed.
    SelectionChanged,
    /// The mark set changed. Emitted once per batch operation.
    MarksChanged,
    /// Row data changed. `row: None` means the whole table (populate, resort, insert, remove).
    DataChanged { row: Option<usize> },
}

/// Token returned by [`ChangeNotifier::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

/// Ordered list of change handlers.
///
/// Cloning yields another handle to the same registry, so a handler can capture a clone
/// and unsubscribe itself (or others) while a notification is being dispatched.
pub struct ChangeNotifier<E: 'static = TableEvent> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E: 'static> Clone for ChangeNotifier<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<E: 'static> Default for ChangeNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> std::fmt::Debug for ChangeNotifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E: 'static> ChangeNotifier<E> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Registers a handler. Handlers are invoked in registration order.
    pub fn subscribe(&self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let mut registry = self.registry.borrow_mut();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        let handler: Handler<E> = Rc::new(RefCell::new(handler));
        registry.handlers.push((id, handler));
        id
    }

    /// Removes a handler. Returns false if it was not registered.
    /// A handler removed during dispatch does not receive the in-flight notification.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.handlers.len();
        registry.handlers.retain(|(handler_id, _)| *handler_id != id);
        registry.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().handlers.len()
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.registry.borrow().handlers.iter().any(|(handler_id, _)| *handler_id == id)
    }

    /// Delivers `event` to every handler registered at the time of the call.
    pub fn notify(&self, event: &E) {
        // Snapshot so handlers may subscribe/unsubscribe without invalidating the loop.
        let snapshot: Vec<(SubscriptionId, Handler<E>)> = self
            .registry
            .borrow()
            .handlers
            .iter()
            .map(|(id, handler)| (*id, Rc::clone(handler)))
            .collect();

        for (id, handler) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            match handler.try_borrow_mut() {
                Ok(mut handler) => (&mut *handler)(event),
                Err(_) => log::warn!("ChangeNotifier: skipping re-entrant dispatch to subscriber {:?}", id),
            }
        }
    }
}
