//! Subscription listeners
//!
//! Listener callbacks run under the registry lock. A failing or panicking
//! listener is logged and skipped; it never affects the other listeners or
//! the subscription outcome.

use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::ListenerError;
use crate::subscription::Subscription;

pub trait SubscriptionListener: Send + Sync {
    fn subscribed(&self, subscription: &Subscription) -> Result<(), ListenerError>;

    fn unsubscribed(&self, subscription: &Subscription) -> Result<(), ListenerError>;
}

/// The registered listeners of one server
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn SubscriptionListener>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn SubscriptionListener>) {
        self.listeners.write().push(listener);
    }

    /// Replace every registered listener
    pub fn set(&self, listeners: Vec<Arc<dyn SubscriptionListener>>) {
        *self.listeners.write() = listeners;
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn notify_subscribed(&self, subscription: &Subscription) {
        for listener in self.snapshot() {
            isolate("subscribe", subscription, || listener.subscribed(subscription));
        }
    }

    pub fn notify_unsubscribed(&self, subscription: &Subscription) {
        for listener in self.snapshot() {
            isolate("unsubscribe", subscription, || {
                listener.unsubscribed(subscription)
            });
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn SubscriptionListener>> {
        self.listeners.read().clone()
    }
}

fn isolate<F>(event: &str, subscription: &Subscription, callback: F)
where
    F: FnOnce() -> Result<(), ListenerError>,
{
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!(
            "Listener {} failed for {}: {}",
            event,
            subscription.raw_id(),
            e
        ),
        Err(_) => log::error!(
            "Listener {} panicked for {}",
            event,
            subscription.raw_id()
        ),
    }
}
