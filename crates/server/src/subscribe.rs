//! Subscribe flow

use indexmap::IndexMap;
use livedata_core::{
    ExternalId, LIVE_DATA_PERMISSION_DENIED_FIELD, LiveDataSpecification, RawId,
    SubscriptionResponse, SubscriptionResult,
};
use std::sync::Arc;

use crate::distributor::MarketDataDistributor;
use crate::error::{Error, Result};
use crate::registry::RegistryGuard;
use crate::server::StandardLiveDataServer;
use crate::subscription::Subscription;

/// Subscriptions created by the current batch, not yet established upstream
struct PendingSubscriptions {
    subscriptions: IndexMap<RawId, Arc<Subscription>>,
    /// Response index of every item that created or joined a new subscription
    items: Vec<(usize, RawId)>,
}

impl PendingSubscriptions {
    fn new() -> Self {
        Self {
            subscriptions: IndexMap::new(),
            items: Vec::new(),
        }
    }

    fn raw_ids(&self) -> Vec<RawId> {
        self.subscriptions.keys().cloned().collect()
    }

    /// Mark every item of `raw_id` with `result` and forget the subscription
    fn fail(
        &mut self,
        raw_id: &str,
        responses: &mut [SubscriptionResponse],
        result: SubscriptionResult,
        message: &str,
    ) -> Option<Arc<Subscription>> {
        for (idx, item_raw_id) in &self.items {
            if item_raw_id == raw_id {
                let requested = responses[*idx].requested_specification.clone();
                responses[*idx] = SubscriptionResponse::error(requested, result, message);
            }
        }
        self.items.retain(|(_, item_raw_id)| item_raw_id != raw_id);
        self.subscriptions.shift_remove(raw_id)
    }
}

impl StandardLiveDataServer {
    /// Subscribe to a batch of specifications; one response per input, in
    /// input order.
    ///
    /// Per-item failures come back as responses. An `Err` means the batch
    /// failed as a whole (admission veto, provider failure or a dropped
    /// connection) and nothing from it was kept.
    pub async fn subscribe(
        &self,
        specs: &[LiveDataSpecification],
        persistent: bool,
    ) -> Result<Vec<SubscriptionResponse>> {
        self.verify_connection_ok()?;

        let resolved = self.resolver.resolve(specs)?;
        let now = self.clock.now();
        let expiry = now + self.expiration.timeout_extension();
        let domain = self.provider.unique_id_domain();

        let mut registry = self.registry.lock().await;
        let mut responses = Vec::with_capacity(specs.len());
        let mut pending = PendingSubscriptions::new();
        let mut created: Vec<Arc<MarketDataDistributor>> = Vec::new();

        for (idx, spec) in specs.iter().enumerate() {
            let Some(distribution_spec) = resolved.get(spec) else {
                log::info!("Unable to work out distribution spec for specification {}", spec);
                responses.push(SubscriptionResponse::error(
                    spec.clone(),
                    SubscriptionResult::NotPresent,
                    format!("Unable to work out distribution spec for specification {}", spec),
                ));
                continue;
            };
            let fq = distribution_spec.fully_qualified_specification();
            let target = distribution_spec.tick_distribution_target();

            if let Some(existing) = registry.distributor(fq) {
                log::info!("Already subscribed to {}", fq);
                if persistent {
                    existing.set_persistent(true);
                }
                existing.set_expiry(expiry);
                if pending.subscriptions.contains_key(existing.raw_id()) {
                    pending.items.push((idx, existing.raw_id().to_string()));
                }
                responses.push(SubscriptionResponse::success(spec.clone(), fq.clone(), target));
                continue;
            }

            let Some(raw_id) = fq.identifier(&domain) else {
                responses.push(SubscriptionResponse::error(
                    spec.clone(),
                    SubscriptionResult::InternalError,
                    format!("Qualified spec {} does not contain ID of domain {}", fq, domain),
                ));
                continue;
            };

            let subscription = if let Some(new) = pending.subscriptions.get(raw_id) {
                new.clone()
            } else if let Some(existing) = registry.subscription(raw_id) {
                existing
            } else {
                let new = Arc::new(Subscription::new(
                    raw_id,
                    self.sender_factory.clone(),
                    now,
                ));
                pending
                    .subscriptions
                    .insert(raw_id.to_string(), new.clone());
                new
            };
            if pending.subscriptions.contains_key(raw_id) {
                pending.items.push((idx, raw_id.to_string()));
            }

            let distributor =
                subscription.create_distributor(distribution_spec.clone(), persistent, expiry);
            registry.insert_distributor(distributor.clone());
            created.push(distributor);
            responses.push(SubscriptionResponse::success(spec.clone(), fq.clone(), target));
        }

        if pending.subscriptions.is_empty() {
            return Ok(responses);
        }

        let established = match self
            .establish(&mut registry, &mut pending, &mut responses)
            .await
        {
            Ok(established) => established,
            Err(e) => {
                log::error!("Failed to subscribe, rolling back: {}", e);
                self.roll_back(&mut registry, &pending, &created);
                return Err(e);
            }
        };
        drop(registry);

        if !established.is_empty() {
            self.hooks.subscription_done(&established);
        }
        Ok(responses)
    }

    /// Admission check, initial snapshots, registration and the upstream
    /// subscribe for every pending subscription. Returns the raw ids that
    /// were established.
    async fn establish(
        &self,
        registry: &mut RegistryGuard<'_>,
        pending: &mut PendingSubscriptions,
        responses: &mut [SubscriptionResponse],
    ) -> Result<Vec<RawId>> {
        self.hooks
            .check_subscribe(&pending.raw_ids())
            .map_err(Error::SubscriptionRejected)?;

        let needs_snapshot: Vec<RawId> = pending
            .subscriptions
            .values()
            .filter(|subscription| {
                self.provider
                    .snapshot_on_subscription_start_required(subscription)
            })
            .map(|subscription| subscription.raw_id().to_string())
            .collect();
        if !needs_snapshot.is_empty() {
            let snapshots = self.provider.do_snapshot(&needs_snapshot).await?;
            for raw_id in &needs_snapshot {
                let Some(fields) = snapshots.get(raw_id) else {
                    log::warn!("No initial snapshot returned for {}", raw_id);
                    continue;
                };
                if fields.has_field(LIVE_DATA_PERMISSION_DENIED_FIELD) {
                    let message = fields
                        .get_text(LIVE_DATA_PERMISSION_DENIED_FIELD)
                        .unwrap_or("Permission denied");
                    log::info!("Permission denied for {}: {}", raw_id, message);
                    if let Some(subscription) = pending.fail(
                        raw_id,
                        responses,
                        SubscriptionResult::NotAuthorized,
                        message,
                    ) {
                        registry.purge(&subscription);
                    }
                    continue;
                }
                if let Some(subscription) = pending.subscriptions.get(raw_id) {
                    subscription.initial_snapshot_received(fields);
                }
            }
        }

        if pending.subscriptions.is_empty() {
            return Ok(Vec::new());
        }

        // Registered before the upstream call so ticks arriving before the
        // handle is stored still find their subscription
        for subscription in pending.subscriptions.values() {
            registry.register(subscription.clone());
        }

        let raw_ids = pending.raw_ids();
        let handles = self.provider.do_subscribe(&raw_ids).await?;

        let mut established = Vec::with_capacity(raw_ids.len());
        for raw_id in raw_ids {
            match handles.get(&raw_id) {
                Some(handle) => {
                    let Some(subscription) = pending.subscriptions.get(&raw_id).cloned() else {
                        continue;
                    };
                    subscription.set_handle(Some(handle.clone()));
                    registry.activate(subscription.clone());
                    self.listeners.notify_subscribed(&subscription);
                    log::info!("Created {}", subscription);
                    established.push(raw_id);
                }
                None => {
                    log::error!("Failed to subscribe to {}: no handle returned", raw_id);
                    if let Some(subscription) = pending.fail(
                        &raw_id,
                        responses,
                        SubscriptionResult::InternalError,
                        "Upstream subscription was not established",
                    ) {
                        registry.purge(&subscription);
                    }
                }
            }
        }
        Ok(established)
    }

    /// Undo every registry change a failed batch made
    fn roll_back(
        &self,
        registry: &mut RegistryGuard<'_>,
        pending: &PendingSubscriptions,
        created: &[Arc<MarketDataDistributor>],
    ) {
        for distributor in created {
            let fq = distributor.fully_qualified_specification();
            let is_current = registry
                .distributor(fq)
                .is_some_and(|current| Arc::ptr_eq(&current, distributor));
            if !is_current {
                continue;
            }
            registry.remove_distributor(fq);
            if let Some(subscription) = registry.subscription(distributor.raw_id()) {
                subscription.remove_distributor(distributor.distribution_spec());
            }
        }
        for subscription in pending.subscriptions.values() {
            registry.purge(subscription);
        }
    }

    /// Subscribe to one specification and return its single response
    pub async fn subscribe_one(
        &self,
        spec: &LiveDataSpecification,
        persistent: bool,
    ) -> Result<SubscriptionResponse> {
        let mut responses = self.subscribe(std::slice::from_ref(spec), persistent).await?;
        match responses.len() {
            1 => Ok(responses.remove(0)),
            n => {
                log::error!("Expected exactly one response for {}, got {}", spec, n);
                Ok(SubscriptionResponse::error(
                    spec.clone(),
                    SubscriptionResult::InternalError,
                    format!("Expected exactly one response, got {}", n),
                ))
            }
        }
    }

    /// Subscribe by bare raw id, using the default rule set and the
    /// provider's id domain
    pub async fn subscribe_raw(&self, raw_id: &str, persistent: bool) -> Result<SubscriptionResponse> {
        let spec = LiveDataSpecification::of(
            self.default_normalization_rule_set_id.clone(),
            ExternalId::of(self.provider.unique_id_domain(), raw_id),
        );
        self.subscribe_one(&spec, persistent).await
    }
}
