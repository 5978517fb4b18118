//! Event subscriptions
//!
//! Handlers run synchronously, in registration order, within the turn the
//! event is observed. Nothing is batched or reordered.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

impl<T> Registry<T> {
    fn remove(&mut self, id: u64) {
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
    }
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fan-out list of handlers for one event type
pub struct Subscribers<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler; it stays active until the returned handle is cancelled
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                lock(&registry).remove(id);
            }
        })
    }

    /// Deliver `event` to every live handler
    pub fn emit(&self, event: &T) {
        // Snapshot so handlers may subscribe or cancel while being invoked
        let handlers: Vec<Handler<T>> = lock(&self.registry)
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Cancellation handle returned by every `subscribe*` call
///
/// Dropping the handle does not cancel; call [`Subscription::cancel`].
pub struct Subscription {
    canceller: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new<F>(canceller: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            canceller: Some(Box::new(canceller)),
        }
    }

    /// Remove the handler. Cancelling twice is harmless.
    pub fn cancel(&mut self) {
        if let Some(canceller) = self.canceller.take() {
            canceller();
        }
    }

    pub fn is_active(&self) -> bool {
        self.canceller.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
