//! Typed notification channels
//!
//! A [`Channel`] is a closed, single-payload subscriber list. Callbacks run
//! synchronously on the emitting thread, in registration order, after every
//! internal lock has been released, so a callback may freely call back into
//! the component that emitted.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError, Weak},
};

type Callback<T> = Arc<dyn Fn(&T) -> eyre::Result<()> + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

pub struct Channel<T> {
    name: &'static str,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Channel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }

    /// Register a callback. It stays registered until
    /// [`Subscription::unsubscribe`] is called or the channel is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) -> eyre::Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Arc::new(callback)));
        drop(registry);

        tracing::trace!(channel = self.name, subscriber = id, "subscribed");

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        let channel = self.name;
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
                    registry.callbacks.retain(|(existing, _)| *existing != id);
                    tracing::trace!(channel, subscriber = id, "unsubscribed");
                }
            })),
        }
    }

    /// Deliver `value` to every subscriber. A subscriber that returns an
    /// error or panics is logged and skipped; delivery continues with the
    /// next one.
    pub fn emit(&self, value: &T) {
        let callbacks: Vec<(u64, Callback<T>)> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.callbacks.clone()
        };

        for (id, callback) in callbacks {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(value))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(channel = self.name, subscriber = id, error = %e, "subscriber failed");
                }
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic payload".to_string());
                    tracing::error!(channel = self.name, subscriber = id, panic = %message, "subscriber panicked");
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("name", &self.name).finish()
    }
}

/// Handle returned by [`Channel::subscribe`]
///
/// Dropping the handle does not unsubscribe.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}
