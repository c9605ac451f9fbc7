//! Shared fixtures for live data server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use livedata_clock::ManualClock;
use livedata_core::{
    ExternalId, ExternalScheme, FieldContainer, FieldNameChange, LIVE_DATA_PERMISSION_DENIED_FIELD,
    LiveDataSpecification, NormalizationRuleSet, RawId, RequiredFieldFilter,
};
use livedata_server::{
    LiveDataServerConfig, MarketDataDistributor, NaiveDistributionSpecificationResolver,
    ProviderError, StandardLiveDataServer, Subscription, SubscriptionHandle, UpstreamProvider,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const SCHEME: &str = "SIM";

/// Rule set without rules
pub const PLAIN: &str = "R";
/// Renames PRICE to LAST
pub const RENAMED: &str = "Renamed";
/// Drops ticks until BID is known
pub const NEEDS_BID: &str = "NeedsBid";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn spec(rule_set: &str, raw_id: &str) -> LiveDataSpecification {
    LiveDataSpecification::of(rule_set, ExternalId::of(SCHEME, raw_id))
}

pub fn resolver() -> Arc<NaiveDistributionSpecificationResolver> {
    Arc::new(
        NaiveDistributionSpecificationResolver::new()
            .with_rule_set(NormalizationRuleSet::new(PLAIN, Vec::new()))
            .with_rule_set(NormalizationRuleSet::new(
                RENAMED,
                vec![Arc::new(FieldNameChange::new([("PRICE", "LAST")]))],
            ))
            .with_rule_set(NormalizationRuleSet::new(
                NEEDS_BID,
                vec![Arc::new(RequiredFieldFilter::new(["BID"]))],
            )),
    )
}

/// Upstream provider stub counting every call
#[derive(Default)]
pub struct StubProvider {
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub subscribe_calls: AtomicUsize,
    pub unsubscribe_calls: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
    pub subscribed: Mutex<Vec<Vec<RawId>>>,
    pub unsubscribed: Mutex<Vec<SubscriptionHandle>>,
    pub snapshot_requests: Mutex<Vec<Vec<RawId>>>,
    handles: Mutex<HashMap<RawId, String>>,
    snapshots: Mutex<HashMap<RawId, FieldContainer>>,
    refused: Mutex<HashSet<RawId>>,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    snapshot_on_start: AtomicBool,
    empty_implies_empty: AtomicBool,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle returned for `raw_id`; defaults to `H-{raw_id}`
    pub fn with_handle(self, raw_id: &str, handle: &str) -> Self {
        self.handles.lock().insert(raw_id.into(), handle.into());
        self
    }

    pub fn with_snapshot(self, raw_id: &str, fields: FieldContainer) -> Self {
        self.snapshots.lock().insert(raw_id.into(), fields);
        self
    }

    /// Snapshot answering with the permission-denied marker
    pub fn with_denied(self, raw_id: &str) -> Self {
        self.with_snapshot(
            raw_id,
            FieldContainer::new().with(LIVE_DATA_PERMISSION_DENIED_FIELD, "No entitlement"),
        )
    }

    /// Leave `raw_id` out of every `do_subscribe` answer
    pub fn with_refused(self, raw_id: &str) -> Self {
        self.refused.lock().insert(raw_id.into());
        self
    }

    pub fn with_snapshot_on_start(self) -> Self {
        self.snapshot_on_start.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_empty_implies_empty(self) -> Self {
        self.empty_implies_empty.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    pub fn set_refused(&self, raw_id: &str) {
        self.refused.lock().insert(raw_id.into());
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamProvider for StubProvider {
    fn unique_id_domain(&self) -> ExternalScheme {
        ExternalScheme::new(SCHEME)
    }

    async fn do_connect(&self) -> Result<(), ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn do_disconnect(&self) -> Result<(), ProviderError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn do_subscribe(
        &self,
        raw_ids: &[RawId],
    ) -> Result<HashMap<RawId, SubscriptionHandle>, ProviderError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.subscribed.lock().push(raw_ids.to_vec());
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("stub configured to fail".into()));
        }

        let handles = self.handles.lock();
        let refused = self.refused.lock();
        Ok(raw_ids
            .iter()
            .filter(|raw_id| !refused.contains(*raw_id))
            .map(|raw_id| {
                let handle = handles
                    .get(raw_id)
                    .cloned()
                    .unwrap_or_else(|| format!("H-{}", raw_id));
                (raw_id.clone(), SubscriptionHandle::new(handle))
            })
            .collect())
    }

    async fn do_unsubscribe(&self, handles: &[SubscriptionHandle]) -> Result<(), ProviderError> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(ProviderError::Failed("stub configured to fail".into()));
        }
        self.unsubscribed.lock().extend(handles.iter().cloned());
        Ok(())
    }

    async fn do_snapshot(
        &self,
        raw_ids: &[RawId],
    ) -> Result<HashMap<RawId, FieldContainer>, ProviderError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot_requests.lock().push(raw_ids.to_vec());
        let snapshots = self.snapshots.lock();
        Ok(raw_ids
            .iter()
            .filter_map(|raw_id| snapshots.get(raw_id).map(|f| (raw_id.clone(), f.clone())))
            .collect())
    }

    fn snapshot_on_subscription_start_required(&self, _subscription: &Subscription) -> bool {
        self.snapshot_on_start.load(Ordering::SeqCst)
    }

    fn empty_subscription_implies_empty_snapshot(&self, _distributor: &MarketDataDistributor) -> bool {
        self.empty_implies_empty.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub server: Arc<StandardLiveDataServer>,
    pub provider: Arc<StubProvider>,
    pub clock: Arc<ManualClock>,
}

pub fn start_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Unconnected server over `provider` with a frozen clock
pub fn harness_with_config(provider: StubProvider, config: LiveDataServerConfig) -> Harness {
    let provider = Arc::new(provider);
    let clock = ManualClock::new(Some(start_time()));
    let server = StandardLiveDataServer::builder(provider.clone(), resolver())
        .with_clock(clock.clone())
        .with_config(config)
        .build();
    Harness {
        server,
        provider,
        clock,
    }
}

/// Connected server over `provider` with default config
pub async fn connected(provider: StubProvider) -> Harness {
    init_logging();
    let harness = harness_with_config(provider, LiveDataServerConfig::default());
    harness.server.connect().await.unwrap();
    harness
}
