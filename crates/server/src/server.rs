//! Standard live data server
//!
//! Owns the registry and drives an [`UpstreamProvider`]. The subscribe,
//! snapshot and request-handling flows live in their own modules as further
//! `impl` blocks on [`StandardLiveDataServer`].

use livedata_clock::SystemClock;
use livedata_core::{
    DistributionSpecification, FieldContainer, LiveDataSpecification, RawId,
};
use livedata_ports::{
    Clock, DistributionSpecificationResolver, EmptyMarketDataSenderFactory, EntitlementChecker,
    MarketDataSenderFactory,
};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::LiveDataServerConfig;
use crate::distributor::MarketDataDistributor;
use crate::entitlement::PermissiveEntitlementChecker;
use crate::error::{Error, Result};
use crate::expiration::ExpirationManager;
use crate::hooks::{NoOpSubscriptionHooks, SubscriptionHooks};
use crate::listener::{ListenerSet, SubscriptionListener};
use crate::performance::PerformanceCounter;
use crate::provider::UpstreamProvider;
use crate::registry::{Registry, RegistryGuard};
use crate::subscription::Subscription;
use crate::trace::SubscriptionTrace;

/// Whether the server is connected to the underlying market data API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    NotConnected,
}

pub struct StandardLiveDataServer {
    pub(crate) provider: Arc<dyn UpstreamProvider>,
    pub(crate) resolver: Arc<dyn DistributionSpecificationResolver>,
    pub(crate) entitlement_checker: Arc<dyn EntitlementChecker>,
    pub(crate) subscription_entitlement_checker: Option<Arc<dyn EntitlementChecker>>,
    pub(crate) sender_factory: Arc<dyn MarketDataSenderFactory>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hooks: Arc<dyn SubscriptionHooks>,
    pub(crate) registry: Registry,
    pub(crate) listeners: ListenerSet,
    pub(crate) expiration: ExpirationManager,
    pub(crate) default_normalization_rule_set_id: String,
    connection: RwLock<ConnectionStatus>,
    lifecycle: tokio::sync::Mutex<()>,
    performance: Option<PerformanceCounter>,
    updates_received: AtomicU64,
}

/// Collaborators and settings for a [`StandardLiveDataServer`]
pub struct LiveDataServerBuilder {
    provider: Arc<dyn UpstreamProvider>,
    resolver: Arc<dyn DistributionSpecificationResolver>,
    entitlement_checker: Arc<dyn EntitlementChecker>,
    subscription_entitlement_checker: Option<Arc<dyn EntitlementChecker>>,
    sender_factory: Arc<dyn MarketDataSenderFactory>,
    clock: Arc<dyn Clock>,
    hooks: Arc<dyn SubscriptionHooks>,
    config: LiveDataServerConfig,
}

impl LiveDataServerBuilder {
    pub fn new(
        provider: Arc<dyn UpstreamProvider>,
        resolver: Arc<dyn DistributionSpecificationResolver>,
    ) -> Self {
        Self {
            provider,
            resolver,
            entitlement_checker: Arc::new(PermissiveEntitlementChecker),
            subscription_entitlement_checker: None,
            sender_factory: Arc::new(EmptyMarketDataSenderFactory),
            clock: SystemClock::shared(),
            hooks: Arc::new(NoOpSubscriptionHooks),
            config: LiveDataServerConfig::default(),
        }
    }

    pub fn with_entitlement_checker(mut self, checker: Arc<dyn EntitlementChecker>) -> Self {
        self.entitlement_checker = checker;
        self
    }

    /// Checker used for subscription requests; falls back to the general one
    pub fn with_subscription_entitlement_checker(
        mut self,
        checker: Arc<dyn EntitlementChecker>,
    ) -> Self {
        self.subscription_entitlement_checker = Some(checker);
        self
    }

    pub fn with_sender_factory(mut self, factory: Arc<dyn MarketDataSenderFactory>) -> Self {
        self.sender_factory = factory;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn SubscriptionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_config(mut self, config: LiveDataServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<StandardLiveDataServer> {
        let config = self.config;
        let performance = config
            .performance_counting
            .then(|| PerformanceCounter::new(config.performance_window_secs));

        Arc::new_cyclic(|server| StandardLiveDataServer {
            provider: self.provider,
            resolver: self.resolver,
            entitlement_checker: self.entitlement_checker,
            subscription_entitlement_checker: self.subscription_entitlement_checker,
            sender_factory: self.sender_factory,
            clock: self.clock,
            hooks: self.hooks,
            registry: Registry::new(),
            listeners: ListenerSet::new(),
            expiration: ExpirationManager::new(server.clone(), &config.expiration),
            default_normalization_rule_set_id: config.default_normalization_rule_set_id,
            connection: RwLock::new(ConnectionStatus::NotConnected),
            lifecycle: tokio::sync::Mutex::new(()),
            performance,
            updates_received: AtomicU64::new(0),
        })
    }
}

impl StandardLiveDataServer {
    pub fn builder(
        provider: Arc<dyn UpstreamProvider>,
        resolver: Arc<dyn DistributionSpecificationResolver>,
    ) -> LiveDataServerBuilder {
        LiveDataServerBuilder::new(provider, resolver)
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.connection.read()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    pub(crate) fn verify_connection_ok(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    pub async fn connect(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }
        self.provider.do_connect().await?;
        self.set_connection_status(ConnectionStatus::Connected);
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if !self.is_connected() {
            return Err(Error::NotConnectedForDisconnect);
        }
        self.provider.do_disconnect().await?;
        self.set_connection_status(ConnectionStatus::NotConnected);
        Ok(())
    }

    /// Record a connection change. Dropping the connection clears every
    /// provider handle, so a reconnect must re-establish raw subscriptions.
    pub fn set_connection_status(&self, status: ConnectionStatus) {
        *self.connection.write() = status;
        log::info!("Connection status changed to {:?}", status);

        if status == ConnectionStatus::NotConnected {
            for subscription in self.registry.registered() {
                subscription.set_handle(None);
            }
        }
    }

    /// Connect if needed and start expiring distributors
    pub async fn start(&self) -> Result<()> {
        if !self.is_connected() {
            self.connect().await?;
        }
        self.expiration.start();
        Ok(())
    }

    /// Stop expiring distributors and disconnect if connected
    pub async fn stop(&self) -> Result<()> {
        self.expiration.stop();
        if self.is_connected() {
            self.disconnect().await?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.expiration.is_running()
    }

    pub fn expiration_manager(&self) -> &ExpirationManager {
        &self.expiration
    }

    pub fn provider(&self) -> &Arc<dyn UpstreamProvider> {
        &self.provider
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn default_normalization_rule_set_id(&self) -> &str {
        &self.default_normalization_rule_set_id
    }

    /// Checker consulted for subscription requests
    pub fn subscription_entitlement_checker(&self) -> &Arc<dyn EntitlementChecker> {
        self.subscription_entitlement_checker
            .as_ref()
            .unwrap_or(&self.entitlement_checker)
    }

    pub fn entitlement_checker(&self) -> &Arc<dyn EntitlementChecker> {
        &self.entitlement_checker
    }

    pub fn add_subscription_listener(&self, listener: Arc<dyn SubscriptionListener>) {
        self.listeners.add(listener);
    }

    pub fn set_subscription_listeners(&self, listeners: Vec<Arc<dyn SubscriptionListener>>) {
        self.listeners.set(listeners);
    }

    /// Re-subscribe every registered raw id in one batch. Ids the provider
    /// does not re-establish are dropped from the registry.
    ///
    /// Returns how many were re-established.
    pub async fn reestablish_subscriptions(&self) -> usize {
        let mut registry = self.registry.lock().await;
        let raw_ids = registry.registered_ids();
        log::warn!(
            "Attempting to re-establish subscriptions for {} securities",
            raw_ids.len()
        );

        let handles = match self.provider.do_subscribe(&raw_ids).await {
            Ok(handles) => handles,
            Err(e) => {
                log::error!("Could not re-establish subscriptions to {:?}: {}", raw_ids, e);
                return 0;
            }
        };
        if handles.len() != raw_ids.len() {
            log::warn!(
                "Have {} securities but only managed to re-establish {}",
                raw_ids.len(),
                handles.len()
            );
        }

        let mut reestablished = 0;
        for raw_id in &raw_ids {
            let Some(subscription) = registry.subscription(raw_id) else {
                continue;
            };
            match handles.get(raw_id) {
                Some(handle) => {
                    log::debug!("Reconnected to {}", raw_id);
                    subscription.set_handle(Some(handle.clone()));
                    reestablished += 1;
                }
                None => {
                    log::warn!(
                        "Couldn't reconnect to {} - removing from active subscriptions",
                        raw_id
                    );
                    registry.purge(&subscription);
                    self.listeners.notify_unsubscribed(&subscription);
                }
            }
        }
        reestablished
    }

    /// Unsubscribe by raw id; false if nothing is subscribed under it
    pub async fn unsubscribe_raw(&self, raw_id: &str) -> Result<bool> {
        match self.get_subscription(raw_id) {
            Some(subscription) => self.unsubscribe(&subscription).await,
            None => Ok(false),
        }
    }

    /// Tear down a subscription and every distributor on it.
    ///
    /// Returns false, without touching anything, if it was no longer active.
    pub async fn unsubscribe(&self, subscription: &Arc<Subscription>) -> Result<bool> {
        self.verify_connection_ok()?;
        let mut registry = self.registry.lock().await;
        self.unsubscribe_locked(&mut registry, subscription).await
    }

    pub(crate) async fn unsubscribe_locked(
        &self,
        registry: &mut RegistryGuard<'_>,
        subscription: &Arc<Subscription>,
    ) -> Result<bool> {
        if !registry.is_active(subscription) {
            log::warn!(
                "Received unsubscription request for non-active subscription: {}",
                subscription
            );
            return Ok(false);
        }

        log::info!("Unsubscribing from {}", subscription);
        // Local state is torn down even when upstream refuses, so the
        // subscription never outlives its distributors
        if let Some(handle) = subscription.handle() {
            if let Err(e) = self.provider.do_unsubscribe(&[handle]).await {
                log::error!("Upstream unsubscribe of {} failed: {}", subscription, e);
            }
        }

        registry.purge(subscription);
        self.listeners.notify_unsubscribed(subscription);
        log::info!("Unsubscribed from {}", subscription);
        Ok(true)
    }

    /// Stop one non-persistent distributor, unsubscribing its subscription
    /// if it was the last one. Persistent distributors are left alone.
    pub async fn stop_distributor(&self, distributor: &Arc<MarketDataDistributor>) -> Result<bool> {
        let mut registry = self.registry.lock().await;
        self.stop_distributor_locked(&mut registry, distributor).await
    }

    pub(crate) async fn stop_distributor_locked(
        &self,
        registry: &mut RegistryGuard<'_>,
        distributor: &Arc<MarketDataDistributor>,
    ) -> Result<bool> {
        let fq = distributor.fully_qualified_specification();
        let is_registered = registry
            .distributor(fq)
            .is_some_and(|current| Arc::ptr_eq(&current, distributor));
        if !is_registered || distributor.is_persistent() {
            return Ok(false);
        }

        let Some(subscription) = registry.subscription(distributor.raw_id()) else {
            registry.remove_distributor(fq);
            return Ok(true);
        };
        let last = subscription.num_distributors() <= 1;
        if last {
            self.verify_connection_ok()?;
        }

        subscription.remove_distributor(distributor.distribution_spec());
        registry.remove_distributor(fq);
        if last {
            self.unsubscribe_locked(registry, &subscription).await?;
        }
        Ok(true)
    }

    /// Stop every expired, non-persistent distributor.
    ///
    /// Holds the registry lock for the whole sweep so a concurrent subscribe
    /// cannot revive a distributor between the expiry check and the stop.
    pub async fn expire_subscriptions(&self) -> Result<usize> {
        let mut registry = self.registry.lock().await;
        let now = self.clock.now();
        let mut expired = 0;
        for distributor in registry.distributors() {
            if !distributor.has_expired(now) {
                continue;
            }
            match self.stop_distributor_locked(&mut registry, &distributor).await {
                Ok(true) => {
                    log::debug!("Expired {}", distributor);
                    expired += 1;
                }
                Ok(false) => {}
                Err(e) => log::warn!("Could not expire {}: {}", distributor, e),
            }
        }
        Ok(expired)
    }

    /// Route a raw update to its subscription. Unknown raw ids are dropped.
    pub fn live_data_received(&self, raw_id: &str, fields: &FieldContainer) {
        log::debug!("Live data received for {}: {}", raw_id, fields);

        self.updates_received.fetch_add(1, Ordering::Relaxed);
        if let Some(counter) = &self.performance {
            counter.hit(self.clock.now());
        }

        match self.registry.subscription(raw_id) {
            Some(subscription) => subscription.live_data_received(fields),
            None => log::warn!(
                "Unexpectedly got data for {} - no subscription is held for it (has it recently expired?)",
                raw_id
            ),
        }
    }

    pub fn num_market_data_updates_received(&self) -> u64 {
        self.updates_received.load(Ordering::Relaxed)
    }

    /// Approximate rate over the performance window, `None` when disabled
    pub fn live_data_updates_per_second(&self) -> Option<f64> {
        self.performance
            .as_ref()
            .map(|counter| counter.hits_per_second(self.clock.now()))
    }

    /// Active subscriptions
    pub async fn get_subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.registry.lock().await.active()
    }

    /// Lock-free lookup by raw id
    pub fn get_subscription(&self, raw_id: &str) -> Option<Arc<Subscription>> {
        self.registry.subscription(raw_id)
    }

    pub async fn get_subscription_by_specification(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<Subscription>> {
        let distributor = self.get_market_data_distributor(fully_qualified).await?;
        self.registry.subscription(distributor.raw_id())
    }

    pub async fn get_market_data_distributor(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        self.registry.lock().await.distributor(fully_qualified)
    }

    pub async fn get_market_data_distributor_for(
        &self,
        distribution_spec: &DistributionSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        let subscription = self
            .get_subscription_by_specification(distribution_spec.fully_qualified_specification())
            .await?;
        subscription.market_data_distributor(distribution_spec)
    }

    /// Distributors for the given fully-qualified specifications; missing
    /// ones are absent from the map
    pub async fn get_market_data_distributors(
        &self,
        fully_qualified: &[LiveDataSpecification],
    ) -> HashMap<LiveDataSpecification, Arc<MarketDataDistributor>> {
        let registry = self.registry.lock().await;
        fully_qualified
            .iter()
            .filter_map(|spec| registry.distributor(spec).map(|d| (spec.clone(), d)))
            .collect()
    }

    pub async fn get_active_subscription_ids(&self) -> BTreeSet<RawId> {
        self.get_subscriptions()
            .await
            .iter()
            .map(|subscription| subscription.raw_id().to_string())
            .collect()
    }

    pub async fn get_active_distribution_specs(&self) -> BTreeSet<String> {
        self.get_subscriptions()
            .await
            .iter()
            .flat_map(|subscription| subscription.distribution_specifications())
            .map(|spec| spec.to_string())
            .collect()
    }

    pub async fn num_active_subscriptions(&self) -> usize {
        self.registry.lock().await.num_active()
    }

    pub fn is_subscribed_to_raw_id(&self, raw_id: &str) -> bool {
        self.registry.contains_raw_id(raw_id)
    }

    pub async fn is_subscribed_to_specification(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> bool {
        self.registry.lock().await.distributor(fully_qualified).is_some()
    }

    pub async fn is_subscribed_to(&self, subscription: &Arc<Subscription>) -> bool {
        self.registry.lock().await.is_active(subscription)
    }

    pub fn get_subscription_trace(&self, raw_id: &str) -> Option<SubscriptionTrace> {
        self.get_subscription(raw_id)
            .map(|subscription| SubscriptionTrace::of(&subscription))
    }
}
