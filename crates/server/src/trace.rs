//! Read-only view of one subscription for operational tooling

use livedata_core::{FieldContainer, LiveDataSpecification, RawId, Timestamp};
use serde::Serialize;

use crate::distributor::MarketDataDistributor;
use crate::subscription::Subscription;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionTrace {
    pub raw_id: RawId,
    pub creation_time: Timestamp,
    pub handle: Option<String>,
    pub distributors: Vec<DistributorTrace>,
    pub last_known_values: FieldContainer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributorTrace {
    pub fully_qualified_specification: LiveDataSpecification,
    pub normalization_rule_set: String,
    pub tick_distribution_target: String,
    pub expiry: Timestamp,
    pub persistent: bool,
    pub messages_sent: u64,
}

impl SubscriptionTrace {
    pub fn of(subscription: &Subscription) -> Self {
        Self {
            raw_id: subscription.raw_id().to_string(),
            creation_time: subscription.creation_time(),
            handle: subscription.handle().map(|h| h.0),
            distributors: subscription
                .distributors()
                .iter()
                .map(|d| DistributorTrace::of(d))
                .collect(),
            last_known_values: subscription.live_data_history().last_known_values(),
        }
    }

    /// Pretty JSON dump
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

impl DistributorTrace {
    pub fn of(distributor: &MarketDataDistributor) -> Self {
        let spec = distributor.distribution_spec();
        Self {
            fully_qualified_specification: spec.fully_qualified_specification().clone(),
            normalization_rule_set: spec.normalization_rule_set().id().to_string(),
            tick_distribution_target: spec.tick_distribution_target().to_string(),
            expiry: distributor.expiry(),
            persistent: distributor.is_persistent(),
            messages_sent: distributor.messages_sent(),
        }
    }
}
