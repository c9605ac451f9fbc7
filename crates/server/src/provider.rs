//! Upstream provider port
//!
//! The feed-specific half of a live data server. The server owns the
//! subscription bookkeeping; a provider only knows how to talk to one
//! market data API.

use async_trait::async_trait;
use livedata_core::{ExternalScheme, FieldContainer, RawId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::distributor::MarketDataDistributor;
use crate::error::ProviderError;
use crate::subscription::Subscription;

/// Opaque provider-side token for an established raw subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(pub String);

impl SubscriptionHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    /// Scheme of the identifiers this provider subscribes by
    fn unique_id_domain(&self) -> ExternalScheme;

    async fn do_connect(&self) -> Result<(), ProviderError>;

    async fn do_disconnect(&self) -> Result<(), ProviderError>;

    /// Establish raw subscriptions. Ids missing from the returned map were
    /// not established.
    async fn do_subscribe(
        &self,
        raw_ids: &[RawId],
    ) -> Result<HashMap<RawId, SubscriptionHandle>, ProviderError>;

    async fn do_unsubscribe(&self, handles: &[SubscriptionHandle]) -> Result<(), ProviderError>;

    /// Current image of each raw id. A field named
    /// [`LIVE_DATA_PERMISSION_DENIED_FIELD`](livedata_core::LIVE_DATA_PERMISSION_DENIED_FIELD)
    /// marks a denial.
    async fn do_snapshot(
        &self,
        raw_ids: &[RawId],
    ) -> Result<HashMap<RawId, FieldContainer>, ProviderError>;

    /// Whether a new subscription needs an initial image because the feed
    /// only sends deltas
    fn snapshot_on_subscription_start_required(&self, subscription: &Subscription) -> bool;

    /// Whether a live distributor holding no values means the instrument
    /// genuinely has none, so a snapshot would come back empty too
    fn empty_subscription_implies_empty_snapshot(&self, _distributor: &MarketDataDistributor) -> bool {
        false
    }
}
