//! Subscription: live interest in one raw provider identifier

use indexmap::IndexMap;
use livedata_core::{DistributionSpecification, FieldContainer, FieldHistoryStore, RawId, Timestamp};
use livedata_ports::MarketDataSenderFactory;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::distributor::MarketDataDistributor;
use crate::provider::SubscriptionHandle;

struct SubscriptionState {
    history: FieldHistoryStore,
    distributors: IndexMap<DistributionSpecification, Arc<MarketDataDistributor>>,
}

/// One raw feed subscription and the distributors fed from it.
///
/// Ticks are applied under the subscription's own lock, so updates for the
/// same raw id reach the distributors in delivery order.
pub struct Subscription {
    raw_id: RawId,
    handle: Mutex<Option<SubscriptionHandle>>,
    state: Mutex<SubscriptionState>,
    creation_time: Timestamp,
    sender_factory: Arc<dyn MarketDataSenderFactory>,
}

impl Subscription {
    pub fn new(
        raw_id: impl Into<RawId>,
        sender_factory: Arc<dyn MarketDataSenderFactory>,
        creation_time: Timestamp,
    ) -> Self {
        Self {
            raw_id: raw_id.into(),
            handle: Mutex::new(None),
            state: Mutex::new(SubscriptionState {
                history: FieldHistoryStore::new(),
                distributors: IndexMap::new(),
            }),
            creation_time,
            sender_factory,
        }
    }

    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }

    pub fn creation_time(&self) -> Timestamp {
        self.creation_time
    }

    pub fn handle(&self) -> Option<SubscriptionHandle> {
        self.handle.lock().clone()
    }

    pub fn set_handle(&self, handle: Option<SubscriptionHandle>) {
        *self.handle.lock() = handle;
    }

    /// Get or create the distributor for `spec`.
    ///
    /// An existing distributor is made persistent when `persistent` is set but
    /// never downgraded; its expiry moves to `expiry` either way. A new
    /// distributor starts from the subscription's current history.
    pub fn create_distributor(
        &self,
        spec: DistributionSpecification,
        persistent: bool,
        expiry: Timestamp,
    ) -> Arc<MarketDataDistributor> {
        let mut state = self.state.lock();
        if let Some(existing) = state.distributors.get(&spec) {
            if persistent {
                existing.set_persistent(true);
            }
            existing.set_expiry(expiry);
            return existing.clone();
        }

        let senders = self.sender_factory.create(&spec);
        let distributor = Arc::new(MarketDataDistributor::new(
            spec.clone(),
            self.raw_id.clone(),
            persistent,
            expiry,
            senders,
        ));
        if !state.history.is_empty() {
            let current = state.history.last_known_values();
            distributor.update_field_history(&current, &state.history);
        }
        state.distributors.insert(spec, distributor.clone());
        distributor
    }

    pub fn remove_distributor(
        &self,
        spec: &DistributionSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        self.state.lock().distributors.shift_remove(spec)
    }

    pub fn remove_all_distributors(&self) -> Vec<Arc<MarketDataDistributor>> {
        self.state
            .lock()
            .distributors
            .drain(..)
            .map(|(_, distributor)| distributor)
            .collect()
    }

    pub fn market_data_distributor(
        &self,
        spec: &DistributionSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        self.state.lock().distributors.get(spec).cloned()
    }

    pub fn distributors(&self) -> Vec<Arc<MarketDataDistributor>> {
        self.state.lock().distributors.values().cloned().collect()
    }

    pub fn distribution_specifications(&self) -> Vec<DistributionSpecification> {
        self.state.lock().distributors.keys().cloned().collect()
    }

    pub fn num_distributors(&self) -> usize {
        self.state.lock().distributors.len()
    }

    pub fn has_distributors(&self) -> bool {
        self.num_distributors() > 0
    }

    /// Copy of the raw last-known values
    pub fn live_data_history(&self) -> FieldHistoryStore {
        self.state.lock().history.clone()
    }

    /// Seed history and every distributor from an initial image
    pub fn initial_snapshot_received(&self, msg: &FieldContainer) {
        let mut state = self.state.lock();
        state.history.live_data_received(msg);
        let SubscriptionState {
            history,
            distributors,
        } = &*state;
        for distributor in distributors.values() {
            distributor.update_field_history(msg, history);
        }
    }

    /// Record a raw tick and fan it out to every distributor
    pub fn live_data_received(&self, msg: &FieldContainer) {
        let mut state = self.state.lock();
        state.history.live_data_received(msg);
        let SubscriptionState {
            history,
            distributors,
        } = &*state;
        for distributor in distributors.values() {
            distributor.distribute_live_data(msg, history);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("raw_id", &self.raw_id)
            .field("handle", &self.handle())
            .field("distributors", &self.num_distributors())
            .finish()
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription[{}]", self.raw_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use livedata_core::{
        ExternalId, FieldNameChange, LiveDataSpecification, NormalizationRuleSet, StandardRules,
    };
    use livedata_ports::EmptyMarketDataSenderFactory;
    use rust_decimal_macros::dec;

    fn spec(rule_set: NormalizationRuleSet) -> DistributionSpecification {
        let fq = LiveDataSpecification::of(rule_set.id().to_string(), ExternalId::of("SIM", "BAR"));
        let target = format!("LiveData.{}", fq);
        DistributionSpecification::new(fq, Arc::new(rule_set), target)
    }

    fn subscription() -> Subscription {
        Subscription::new("BAR", Arc::new(EmptyMarketDataSenderFactory), Utc::now())
    }

    #[test]
    fn test_create_distributor_is_idempotent_and_upgrades_persistence() {
        let sub = subscription();
        let now = Utc::now();
        let spec = spec(StandardRules::no_normalization());

        let first = sub.create_distributor(spec.clone(), false, now);
        let second = sub.create_distributor(spec.clone(), true, now + Duration::minutes(5));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_persistent());
        assert_eq!(first.expiry(), now + Duration::minutes(5));

        // Never downgraded
        sub.create_distributor(spec, false, now);
        assert!(first.is_persistent());
        assert_eq!(sub.num_distributors(), 1);
    }

    #[test]
    fn test_one_tick_feeds_every_distributor() {
        let sub = subscription();
        let now = Utc::now();
        let plain = sub.create_distributor(spec(StandardRules::no_normalization()), false, now);
        let renamed = sub.create_distributor(
            spec(NormalizationRuleSet::new(
                "Renamed",
                vec![Arc::new(FieldNameChange::new([("PX_LAST", "LAST")]))],
            )),
            false,
            now,
        );

        sub.live_data_received(&FieldContainer::new().with("PX_LAST", dec!(42)));

        assert_eq!(
            sub.live_data_history().last_known().get_decimal("PX_LAST"),
            Some(dec!(42))
        );
        assert_eq!(
            plain.snapshot().unwrap().fields.get_decimal("PX_LAST"),
            Some(dec!(42))
        );
        assert_eq!(
            renamed.snapshot().unwrap().fields.get_decimal("LAST"),
            Some(dec!(42))
        );
    }

    #[test]
    fn test_new_distributor_starts_from_history() {
        let sub = subscription();
        sub.initial_snapshot_received(&FieldContainer::new().with("LAST", dec!(7)));

        let distributor =
            sub.create_distributor(spec(StandardRules::no_normalization()), false, Utc::now());
        assert_eq!(
            distributor.snapshot().unwrap().fields.get_decimal("LAST"),
            Some(dec!(7))
        );
    }

    #[test]
    fn test_remove_all_distributors() {
        let sub = subscription();
        sub.create_distributor(spec(StandardRules::no_normalization()), false, Utc::now());
        assert!(sub.has_distributors());
        assert_eq!(sub.remove_all_distributors().len(), 1);
        assert!(!sub.has_distributors());
    }
}
