//! The scanning-active signal shared between the card stream and the scanner.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Subscriber = Box<dyn Fn(bool)>;

/// An observable boolean handle.
///
/// Clones share the same value. The card stream is the only writer and the scanner reads it
/// every frame; anything else that cares about transitions can [`subscribe`](Self::subscribe).
#[derive(Clone, Default)]
pub struct ScanSignal {
    inner: Rc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    active: Cell<bool>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl ScanSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Update the value. Subscribers are only notified when it actually changes.
    pub fn set(&self, active: bool) {
        if self.inner.active.replace(active) == active {
            return;
        }
        for subscriber in self.inner.subscribers.borrow().iter() {
            subscriber(active);
        }
    }

    /// Register a callback invoked with the new value on every transition.
    pub fn subscribe(&self, subscriber: impl Fn(bool) + 'static) {
        self.inner.subscribers.borrow_mut().push(Box::new(subscriber));
    }
}

impl fmt::Debug for ScanSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSignal")
            .field("active", &self.is_active())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let writer = ScanSignal::new();
        let reader = writer.clone();
        assert!(!reader.is_active());
        writer.set(true);
        assert!(reader.is_active());
    }

    #[test]
    fn test_subscribers_see_transitions_only() {
        let signal = ScanSignal::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        signal.subscribe(move |active| sink.borrow_mut().push(active));

        signal.set(false);
        signal.set(true);
        signal.set(true);
        signal.set(false);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }
}
