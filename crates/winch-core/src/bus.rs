//! Validate Bus
//!
//! In-process publish/subscribe channel scoped to one page's lazy loading.
//! Publishing asks every subscribed placeholder to check itself now.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn()>;

/// Validate broadcast channel
#[derive(Clone, Default)]
pub struct ValidateBus {
    subscribers: Rc<RefCell<Vec<(SubscriptionId, Handler)>>>,
    next_id: Rc<Cell<u64>>,
}

impl fmt::Debug for ValidateBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateBus")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl ValidateBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() < before
    }

    /// Notify every subscriber present when the publish started.
    ///
    /// Returns the number notified.
    pub fn publish(&self) -> usize {
        let handlers: Vec<Handler> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        tracing::trace!("validate broadcast to {} subscribers", handlers.len());
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_unsubscribe() {
        let bus = ValidateBus::new();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let first = bus.subscribe(move || counter.set(counter.get() + 1));
        let counter = hits.clone();
        bus.subscribe(move || counter.set(counter.get() + 10));

        assert_eq!(bus.publish(), 2);
        assert_eq!(hits.get(), 11);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.publish(), 1);
        assert_eq!(hits.get(), 21);
    }

    #[test]
    fn test_unsubscribe_during_publish() {
        let bus = ValidateBus::new();
        let hits = Rc::new(Cell::new(0));

        let inner = bus.clone();
        let own_id = Rc::new(Cell::new(None));
        let id_slot = own_id.clone();
        let counter = hits.clone();
        let id = bus.subscribe(move || {
            counter.set(counter.get() + 1);
            if let Some(id) = id_slot.get() {
                inner.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        bus.publish();
        bus.publish();
        assert_eq!(hits.get(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
