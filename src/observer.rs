//! Observer registration for page-side events.
//!
//! DESIGN
//! ======
//! Emitters own a `Listeners<T>`; consumers call `subscribe` and keep the
//! returned `Subscription`. Cancelling or dropping the subscription removes
//! the callback, so a listener never outlives whoever registered it.
//!
//! The embedded page runs on one thread, so the registry is `Rc<RefCell<..>>`.
//! `emit` snapshots the callbacks before calling them, which lets a callback
//! subscribe or unsubscribe without a re-borrow panic.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A set of callbacks for events of type `T`.
pub struct Listeners<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Listeners<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { registry: Rc::new(RefCell::new(Registry { next_id: 0, entries: Vec::new() })) }
    }

    /// Register `callback`. It stays registered until the subscription ends.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Rc::new(callback)));

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    // Drop the callback after releasing the borrow; its captures may unsubscribe too.
                    let removed = {
                        let mut registry = registry.borrow_mut();
                        let position = registry.entries.iter().position(|(entry_id, _)| *entry_id == id);
                        position.map(|at| registry.entries.remove(at))
                    };
                    drop(removed);
                }
            })),
        }
    }

    /// Call every registered callback with `event`, in registration order.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Callback<T>> = self
            .registry
            .borrow()
            .entries
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned registration handle. Unsubscribes on `cancel` or drop.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the callback. Calling it again does nothing.
    pub fn cancel(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

#[cfg(test)]
#[path = "observer_test.rs"]
mod tests;
