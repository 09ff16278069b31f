//! Synchronous observer registry.
//!
//! Listeners are called in registration order on the thread that emits. Each
//! emission works from a snapshot of the registry, so a listener may connect or
//! disconnect listeners (including itself) while it runs. A listener removed
//! during an emission is not called for the rest of that emission.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Rc<dyn Fn(&E)>;

struct Slots<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Slots<E> {
    fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|(l, _)| *l == id)
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }
}

pub struct Signal<E> {
    slots: Rc<RefCell<Slots<E>>>,
}

impl<E: 'static> Signal<E> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn connect<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        let mut slots = self.slots.borrow_mut();
        let id = ListenerId(slots.next_id);
        slots.next_id += 1;
        slots.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` if the listener was not registered.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        self.slots.borrow_mut().remove(id)
    }

    /// Like [`Signal::connect`], but the listener stays registered only as long
    /// as the returned guard lives.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = self.connect(listener);
        let slots: Weak<RefCell<Slots<E>>> = Rc::downgrade(&self.slots);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(slots) = slots.upgrade() {
                    slots.borrow_mut().remove(id);
                }
            })),
        }
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<(ListenerId, Listener<E>)> = self.slots.borrow().listeners.clone();
        for (id, listener) in snapshot {
            if !self.slots.borrow().contains(id) {
                continue;
            }
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.slots.borrow().listeners.len()
    }
}

impl<E: 'static> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Disconnects its listener when dropped.
#[must_use = "dropping a Subscription disconnects the listener immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        self.disconnect();
    }

    fn disconnect(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.disconnect();
    }
}
