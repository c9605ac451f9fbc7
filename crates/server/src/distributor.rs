//! Market data distributor: one normalized output stream of a subscription

use livedata_core::{
    DistributionSpecification, FieldContainer, FieldHistoryStore, LiveDataSpecification,
    LiveDataValueUpdate, RawId, Timestamp,
};
use livedata_ports::MarketDataSender;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

struct DistributorState {
    expiry: Timestamp,
    last_known: FieldHistoryStore,
    sequence_number: u64,
    messages_sent: u64,
}

/// Publishes one [`DistributionSpecification`] of a raw subscription.
///
/// Owned by exactly one [`Subscription`](crate::Subscription), found by its
/// raw id. Expiry is only consulted while non-persistent.
pub struct MarketDataDistributor {
    distribution_spec: DistributionSpecification,
    raw_id: RawId,
    persistent: AtomicBool,
    state: Mutex<DistributorState>,
    senders: Vec<Box<dyn MarketDataSender>>,
}

impl MarketDataDistributor {
    pub fn new(
        distribution_spec: DistributionSpecification,
        raw_id: impl Into<RawId>,
        persistent: bool,
        expiry: Timestamp,
        senders: Vec<Box<dyn MarketDataSender>>,
    ) -> Self {
        Self {
            distribution_spec,
            raw_id: raw_id.into(),
            persistent: AtomicBool::new(persistent),
            state: Mutex::new(DistributorState {
                expiry,
                last_known: FieldHistoryStore::new(),
                sequence_number: 0,
                messages_sent: 0,
            }),
            senders,
        }
    }

    pub fn distribution_spec(&self) -> &DistributionSpecification {
        &self.distribution_spec
    }

    pub fn fully_qualified_specification(&self) -> &LiveDataSpecification {
        self.distribution_spec.fully_qualified_specification()
    }

    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }

    pub fn set_persistent(&self, persistent: bool) {
        self.persistent.store(persistent, Ordering::Release);
    }

    pub fn expiry(&self) -> Timestamp {
        self.state.lock().expiry
    }

    pub fn set_expiry(&self, expiry: Timestamp) {
        self.state.lock().expiry = expiry;
    }

    /// Push expiry to `now + extension`
    pub fn extend_expiry(&self, now: Timestamp, extension: chrono::Duration) {
        self.set_expiry(now + extension);
    }

    /// Persistent distributors never expire
    pub fn has_expired(&self, now: Timestamp) -> bool {
        if self.is_persistent() {
            return false;
        }
        self.state.lock().expiry < now
    }

    pub fn messages_sent(&self) -> u64 {
        self.state.lock().messages_sent
    }

    pub fn num_senders(&self) -> usize {
        self.senders.len()
    }

    /// Last normalized image, `None` until a tick or initial snapshot lands
    pub fn snapshot(&self) -> Option<LiveDataValueUpdate> {
        let state = self.state.lock();
        if state.last_known.is_empty() {
            return None;
        }
        Some(LiveDataValueUpdate::new(
            state.sequence_number,
            self.fully_qualified_specification().clone(),
            state.last_known.last_known_values(),
        ))
    }

    /// Normalize and remember an image without publishing it
    pub fn update_field_history(&self, msg: &FieldContainer, history: &FieldHistoryStore) {
        if let Some(normalized) = self.normalize(msg, history) {
            self.state.lock().last_known.live_data_received(&normalized);
        }
    }

    /// Normalize a raw tick and publish it to every sender.
    ///
    /// Returns false when normalization suppressed the tick.
    pub fn distribute_live_data(&self, msg: &FieldContainer, history: &FieldHistoryStore) -> bool {
        let Some(normalized) = self.normalize(msg, history) else {
            log::debug!(
                "Normalization of {} produced no data for {}",
                self.raw_id,
                self.distribution_spec
            );
            return false;
        };

        let mut state = self.state.lock();
        state.last_known.live_data_received(&normalized);
        state.sequence_number += 1;
        let update = LiveDataValueUpdate::new(
            state.sequence_number,
            self.fully_qualified_specification().clone(),
            normalized,
        );
        for sender in &self.senders {
            sender.send(&update);
        }
        state.messages_sent += 1;
        true
    }

    fn normalize(&self, msg: &FieldContainer, history: &FieldHistoryStore) -> Option<FieldContainer> {
        self.distribution_spec
            .normalized_message(msg, &self.raw_id, history)
    }
}

impl fmt::Debug for MarketDataDistributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketDataDistributor")
            .field("distribution_spec", &self.distribution_spec)
            .field("raw_id", &self.raw_id)
            .field("persistent", &self.is_persistent())
            .field("expiry", &self.expiry())
            .finish()
    }
}

impl fmt::Display for MarketDataDistributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distributor[{}]", self.distribution_spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use livedata_core::{ExternalId, FieldFilter, NormalizationRuleSet, StandardRules};
    use parking_lot::Mutex as PlMutex;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Recording(Arc<PlMutex<Vec<LiveDataValueUpdate>>>);

    impl MarketDataSender for Recording {
        fn send(&self, update: &LiveDataValueUpdate) {
            self.0.lock().push(update.clone());
        }
    }

    fn spec(rule_set: NormalizationRuleSet) -> DistributionSpecification {
        DistributionSpecification::new(
            LiveDataSpecification::of(rule_set.id().to_string(), ExternalId::of("SIM", "FOO")),
            Arc::new(rule_set),
            "LiveData.FOO",
        )
    }

    #[test]
    fn test_persistent_never_expires() {
        let now = Utc::now();
        let distributor = MarketDataDistributor::new(
            spec(StandardRules::no_normalization()),
            "FOO",
            true,
            now - Duration::hours(1),
            Vec::new(),
        );
        assert!(!distributor.has_expired(now));

        distributor.set_persistent(false);
        assert!(distributor.has_expired(now));

        distributor.extend_expiry(now, Duration::minutes(10));
        assert!(!distributor.has_expired(now + Duration::minutes(9)));
        assert!(distributor.has_expired(now + Duration::minutes(11)));
    }

    #[test]
    fn test_distribute_sequences_and_remembers() {
        let recording = Recording::default();
        let distributor = MarketDataDistributor::new(
            spec(StandardRules::no_normalization()),
            "FOO",
            false,
            Utc::now(),
            vec![Box::new(recording.clone())],
        );
        assert!(distributor.snapshot().is_none());

        let history = FieldHistoryStore::new();
        distributor.distribute_live_data(&FieldContainer::new().with("BID", dec!(99)), &history);
        distributor.distribute_live_data(&FieldContainer::new().with("ASK", dec!(101)), &history);

        let sent = recording.0.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].sequence_number, 1);
        assert_eq!(sent[1].sequence_number, 2);
        assert_eq!(distributor.messages_sent(), 2);

        let snapshot = distributor.snapshot().unwrap();
        assert_eq!(snapshot.fields.get_decimal("BID"), Some(dec!(99)));
        assert_eq!(snapshot.fields.get_decimal("ASK"), Some(dec!(101)));
    }

    #[test]
    fn test_suppressed_tick_is_not_sent() {
        let recording = Recording::default();
        let filter = NormalizationRuleSet::new("LastOnly", vec![Arc::new(FieldFilter::new(["LAST"]))]);
        let distributor = MarketDataDistributor::new(
            spec(filter),
            "FOO",
            false,
            Utc::now(),
            vec![Box::new(recording.clone())],
        );

        let sent = distributor.distribute_live_data(
            &FieldContainer::new().with("BID", dec!(99)),
            &FieldHistoryStore::new(),
        );
        assert!(!sent);
        assert!(recording.0.lock().is_empty());
        assert!(distributor.snapshot().is_none());
    }

    #[test]
    fn test_update_field_history_does_not_publish() {
        let recording = Recording::default();
        let distributor = MarketDataDistributor::new(
            spec(StandardRules::no_normalization()),
            "FOO",
            false,
            Utc::now(),
            vec![Box::new(recording.clone())],
        );

        distributor.update_field_history(
            &FieldContainer::new().with("LAST", dec!(100)),
            &FieldHistoryStore::new(),
        );
        assert!(recording.0.lock().is_empty());
        assert_eq!(
            distributor.snapshot().unwrap().fields.get_decimal("LAST"),
            Some(dec!(100))
        );
    }
}
