/// Multicast change notifications.
///
/// A `Relay<T>` is an explicit observer registry: any number of independent
/// listeners subscribe, every emit is delivered to all listeners current at
/// that moment, and there is no ordering guarantee between listeners.
/// Delivery is synchronous and never suspends.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ListenerMap<T> = Mutex<HashMap<u64, Listener<T>>>;

pub struct Relay<T> {
    listeners: Arc<ListenerMap<T>>,
    next_id: Mutex<u64>,
}

impl<T> Relay<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: Mutex::new(0),
        }
    }

    /// Register a listener. The returned handle unsubscribes when dropped
    /// or via [`Subscription::unsubscribe`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };

        self.listeners.lock().insert(id, Arc::new(listener));

        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            id,
        }
    }

    /// Deliver `value` to every current listener.
    ///
    /// Listener callbacks run outside the registry lock, so a callback may
    /// subscribe to or emit on other relays without deadlocking.
    pub fn emit(&self, value: &T) {
        let current: Vec<Listener<T>> = self.listeners.lock().values().cloned().collect();

        for listener in current {
            listener(value);
        }
    }

    /// Number of active listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<T> Default for Relay<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribe handle returned by [`Relay::subscribe`].
///
/// Holds only a weak reference back to the registry, so an outstanding
/// subscription never keeps its emitter alive.
pub struct Subscription<T> {
    listeners: Weak<ListenerMap<T>>,
    id: u64,
}

impl<T> Subscription<T> {
    /// Remove the listener now instead of waiting for drop.
    pub fn unsubscribe(self) {
        // Drop impl does the removal.
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().remove(&self.id);
        }
    }
}
