//! Subscription registry
//!
//! Raw id → subscription lives in a concurrent map so the tick path never
//! waits on the registry lock. Every structural change goes through a
//! [`RegistryGuard`], which holds the one registry mutex and keeps the raw-id
//! index, the fully-qualified index and the active set consistent.

use dashmap::DashMap;
use indexmap::IndexMap;
use livedata_core::{LiveDataSpecification, RawId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::distributor::MarketDataDistributor;
use crate::subscription::Subscription;

#[derive(Default)]
struct RegistryState {
    distributors: HashMap<LiveDataSpecification, Arc<MarketDataDistributor>>,
    active: IndexMap<RawId, Arc<Subscription>>,
}

#[derive(Default)]
pub(crate) struct Registry {
    by_raw_id: DashMap<RawId, Arc<Subscription>>,
    state: Mutex<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            by_raw_id: &self.by_raw_id,
            state: self.state.lock().await,
        }
    }

    /// Lock-free lookup
    pub fn subscription(&self, raw_id: &str) -> Option<Arc<Subscription>> {
        self.by_raw_id.get(raw_id).map(|entry| entry.value().clone())
    }

    pub fn contains_raw_id(&self, raw_id: &str) -> bool {
        self.by_raw_id.contains_key(raw_id)
    }

    /// Every registered subscription, active or still being established
    pub fn registered(&self) -> Vec<Arc<Subscription>> {
        self.by_raw_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

pub(crate) struct RegistryGuard<'a> {
    by_raw_id: &'a DashMap<RawId, Arc<Subscription>>,
    state: MutexGuard<'a, RegistryState>,
}

impl RegistryGuard<'_> {
    pub fn subscription(&self, raw_id: &str) -> Option<Arc<Subscription>> {
        self.by_raw_id.get(raw_id).map(|entry| entry.value().clone())
    }

    pub fn registered_ids(&self) -> Vec<RawId> {
        self.by_raw_id.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Add to the raw-id index without activating
    pub fn register(&mut self, subscription: Arc<Subscription>) {
        self.by_raw_id
            .insert(subscription.raw_id().to_string(), subscription);
    }

    pub fn activate(&mut self, subscription: Arc<Subscription>) {
        self.state
            .active
            .insert(subscription.raw_id().to_string(), subscription);
    }

    /// Drop from the raw-id index and the active set
    pub fn unregister(&mut self, raw_id: &str) -> Option<Arc<Subscription>> {
        self.state.active.shift_remove(raw_id);
        self.by_raw_id.remove(raw_id).map(|(_, subscription)| subscription)
    }

    pub fn is_active(&self, subscription: &Arc<Subscription>) -> bool {
        self.state
            .active
            .get(subscription.raw_id())
            .is_some_and(|active| Arc::ptr_eq(active, subscription))
    }

    pub fn active(&self) -> Vec<Arc<Subscription>> {
        self.state.active.values().cloned().collect()
    }

    pub fn num_active(&self) -> usize {
        self.state.active.len()
    }

    pub fn distributor(&self, fq: &LiveDataSpecification) -> Option<Arc<MarketDataDistributor>> {
        self.state.distributors.get(fq).cloned()
    }

    pub fn insert_distributor(&mut self, distributor: Arc<MarketDataDistributor>) {
        self.state.distributors.insert(
            distributor.fully_qualified_specification().clone(),
            distributor,
        );
    }

    pub fn remove_distributor(
        &mut self,
        fq: &LiveDataSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        self.state.distributors.remove(fq)
    }

    pub fn distributors(&self) -> Vec<Arc<MarketDataDistributor>> {
        self.state.distributors.values().cloned().collect()
    }

    /// Remove a subscription and all its distributors from every index
    pub fn purge(&mut self, subscription: &Subscription) {
        for distributor in subscription.remove_all_distributors() {
            self.remove_distributor(distributor.fully_qualified_specification());
        }
        self.unregister(subscription.raw_id());
    }
}
