//! The narrow server interface shared by standard and combining servers

use async_trait::async_trait;
use livedata_core::{LiveDataSpecification, SubscriptionResponse};
use std::collections::HashMap;
use std::sync::Arc;

use crate::distributor::MarketDataDistributor;
use crate::error::Result;
use crate::server::StandardLiveDataServer;
use crate::subscription::Subscription;

#[async_trait]
pub trait LiveDataServer: Send + Sync {
    async fn subscribe(
        &self,
        specs: &[LiveDataSpecification],
        persistent: bool,
    ) -> Result<Vec<SubscriptionResponse>>;

    async fn snapshot(&self, specs: &[LiveDataSpecification]) -> Result<Vec<SubscriptionResponse>>;

    /// Subscription serving a fully-qualified specification
    async fn get_subscription(&self, fully_qualified: &LiveDataSpecification)
    -> Option<Arc<Subscription>>;

    async fn get_market_data_distributor(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<MarketDataDistributor>>;

    async fn get_market_data_distributors(
        &self,
        fully_qualified: &[LiveDataSpecification],
    ) -> HashMap<LiveDataSpecification, Arc<MarketDataDistributor>>;
}

#[async_trait]
impl LiveDataServer for StandardLiveDataServer {
    async fn subscribe(
        &self,
        specs: &[LiveDataSpecification],
        persistent: bool,
    ) -> Result<Vec<SubscriptionResponse>> {
        StandardLiveDataServer::subscribe(self, specs, persistent).await
    }

    async fn snapshot(&self, specs: &[LiveDataSpecification]) -> Result<Vec<SubscriptionResponse>> {
        StandardLiveDataServer::snapshot(self, specs).await
    }

    async fn get_subscription(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<Subscription>> {
        self.get_subscription_by_specification(fully_qualified).await
    }

    async fn get_market_data_distributor(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        StandardLiveDataServer::get_market_data_distributor(self, fully_qualified).await
    }

    async fn get_market_data_distributors(
        &self,
        fully_qualified: &[LiveDataSpecification],
    ) -> HashMap<LiveDataSpecification, Arc<MarketDataDistributor>> {
        StandardLiveDataServer::get_market_data_distributors(self, fully_qualified).await
    }
}
