//! Node bootstrap
//!
//! Wires a standard server to the simulated feed and the in-process
//! transport:
//! - connects and starts the expiration manager
//! - spawns the subscription request, entitlement and heartbeat receivers
//! - subscribes the configured raw ids persistently, in one batch
//! - starts the feed pump

use livedata_clock::SystemClock;
use livedata_core::{
    ExternalId, FieldFilter, LiveDataSpecification, NormalizationRuleSet, StandardRules,
    SubscriptionRequest, SubscriptionResponse, SubscriptionResponseMsg,
};
use livedata_gateway::{
    ChannelPublisher, ChannelRequester, ChannelSenderFactory, ChannelSubscriber,
    EntitlementRequest, EntitlementResponse, Heartbeat, Subjects, TickMessage,
};
use livedata_server::{
    EntitlementServer, HeartbeatReceiver, NaiveDistributionSpecificationResolver,
    StandardLiveDataServer, SubscriptionRequestReceiver, UpstreamProvider,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::RunnerConfig;
use crate::error::Result;
use crate::feed::{ASK, BID, LAST, SimulatedFeedProvider};
use crate::pump::FeedPump;

/// Rule set published under the default id: the quote fields only
pub fn standard_rule_set() -> NormalizationRuleSet {
    NormalizationRuleSet::new(
        StandardRules::OPENGAMMA_RULE_SET_ID,
        vec![Arc::new(FieldFilter::new([LAST, BID, ASK]))],
    )
}

/// Counters reported when a node shuts down
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStats {
    pub active_subscriptions: usize,
    pub distribution_specs: usize,
    pub updates_received: u64,
    pub ticks_pumped: u64,
    pub updates_per_second: Option<f64>,
}

impl fmt::Display for NodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} subscriptions, {} distributions, {} updates received ({} pumped)",
            self.active_subscriptions,
            self.distribution_specs,
            self.updates_received,
            self.ticks_pumped
        )?;
        if let Some(rate) = self.updates_per_second {
            write!(f, ", {:.2}/s", rate)?;
        }
        Ok(())
    }
}

pub struct LiveDataNode {
    server: Arc<StandardLiveDataServer>,
    feed: Arc<SimulatedFeedProvider>,
    sender_factory: ChannelSenderFactory,
    requests: ChannelRequester<SubscriptionRequest, SubscriptionResponseMsg>,
    entitlements: ChannelRequester<EntitlementRequest, EntitlementResponse>,
    heartbeats: ChannelPublisher<Heartbeat>,
    startup_responses: Vec<SubscriptionResponse>,
    receivers: Vec<JoinHandle<()>>,
    pump: FeedPump,
}

impl LiveDataNode {
    pub async fn bootstrap(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.channel_capacity;

        let feed = Arc::new(SimulatedFeedProvider::new(&config.feed));
        let (sender_factory, _) = ChannelSenderFactory::new(capacity);
        let resolver =
            NaiveDistributionSpecificationResolver::new().with_rule_set(standard_rule_set());

        let server = StandardLiveDataServer::builder(feed.clone(), Arc::new(resolver))
            .with_sender_factory(Arc::new(sender_factory.clone()))
            .with_clock(SystemClock::shared())
            .with_config(config.server.clone())
            .build();
        server.start().await?;

        let (requests, request_responder) = ChannelRequester::pair(capacity);
        let (entitlements, entitlement_responder) = ChannelRequester::pair(capacity);
        let (heartbeats, heartbeat_subscriber) =
            ChannelPublisher::pair(Subjects::HEARTBEAT, capacity);
        let receivers = vec![
            SubscriptionRequestReceiver::new(server.clone()).spawn(request_responder),
            EntitlementServer::new(server.entitlement_checker().clone())
                .spawn(entitlement_responder),
            HeartbeatReceiver::new(server.clone()).spawn(heartbeat_subscriber),
        ];

        let domain = feed.unique_id_domain();
        let specs: Vec<LiveDataSpecification> = config
            .subscriptions
            .iter()
            .map(|raw_id| {
                LiveDataSpecification::of(
                    server.default_normalization_rule_set_id(),
                    ExternalId::of(domain.clone(), raw_id.as_str()),
                )
            })
            .collect();
        let startup_responses = if specs.is_empty() {
            Vec::new()
        } else {
            server.subscribe(&specs, true).await?
        };
        for response in &startup_responses {
            if response.is_success() {
                log::info!("Subscribed to {}", response.requested_specification);
            } else {
                log::warn!(
                    "Startup subscription to {} failed ({}): {}",
                    response.requested_specification,
                    response.result.as_str(),
                    response.user_message.as_deref().unwrap_or("")
                );
            }
        }

        let pump = FeedPump::spawn(
            server.clone(),
            feed.clone(),
            Duration::from_millis(config.feed.tick_interval_ms),
        );

        Ok(Self {
            server,
            feed,
            sender_factory,
            requests,
            entitlements,
            heartbeats,
            startup_responses,
            receivers,
            pump,
        })
    }

    pub fn server(&self) -> &Arc<StandardLiveDataServer> {
        &self.server
    }

    pub fn feed(&self) -> &Arc<SimulatedFeedProvider> {
        &self.feed
    }

    /// Responses to the startup subscriptions, in config order
    pub fn startup_responses(&self) -> &[SubscriptionResponse] {
        &self.startup_responses
    }

    /// Client endpoint for subscription requests
    pub fn requests(&self) -> ChannelRequester<SubscriptionRequest, SubscriptionResponseMsg> {
        self.requests.clone()
    }

    /// Client endpoint for entitlement queries
    pub fn entitlements(&self) -> ChannelRequester<EntitlementRequest, EntitlementResponse> {
        self.entitlements.clone()
    }

    pub fn heartbeats(&self) -> &ChannelPublisher<Heartbeat> {
        &self.heartbeats
    }

    /// New consumer of every published tick
    pub fn ticks(&self) -> ChannelSubscriber<TickMessage> {
        self.sender_factory.subscribe()
    }

    pub async fn stats(&self) -> NodeStats {
        NodeStats {
            active_subscriptions: self.server.num_active_subscriptions().await,
            distribution_specs: self.server.get_active_distribution_specs().await.len(),
            updates_received: self.server.num_market_data_updates_received(),
            ticks_pumped: self.pump.ticks_sent(),
            updates_per_second: self.server.live_data_updates_per_second(),
        }
    }

    /// Stop the pump and receivers, then stop the server.
    ///
    /// Returns the final counters.
    pub async fn shutdown(self) -> Result<NodeStats> {
        self.pump.stop();
        for receiver in &self.receivers {
            receiver.abort();
        }
        let stats = self.stats().await;
        self.server.stop().await?;
        log::info!("Node stopped: {}", stats);
        Ok(stats)
    }
}
