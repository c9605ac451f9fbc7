//! Combining server: one façade over several underlying servers
//!
//! A partitioner picks the server owning each specification. Batches are
//! split by owner, dispatched concurrently with bounded parallelism and
//! merged back in input order.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use indexmap::IndexMap;
use livedata_core::{LiveDataSpecification, SubscriptionResponse, SubscriptionResult};
use std::collections::HashMap;
use std::sync::Arc;

use crate::distributor::MarketDataDistributor;
use crate::error::Result;
use crate::facade::LiveDataServer;
use crate::subscription::Subscription;

/// Chooses the underlying server (by index) owning a specification
pub trait ServerPartitioner: Send + Sync {
    fn server_for(&self, spec: &LiveDataSpecification) -> Option<usize>;
}

impl<F> ServerPartitioner for F
where
    F: Fn(&LiveDataSpecification) -> Option<usize> + Send + Sync,
{
    fn server_for(&self, spec: &LiveDataSpecification) -> Option<usize> {
        self(spec)
    }
}

pub struct CombiningLiveDataServer {
    servers: Vec<Arc<dyn LiveDataServer>>,
    partitioner: Arc<dyn ServerPartitioner>,
    max_concurrency: usize,
}

struct Partitioned {
    /// Server index → input indices it owns
    groups: IndexMap<usize, Vec<usize>>,
    unowned: Vec<usize>,
}

impl CombiningLiveDataServer {
    pub fn new(
        servers: Vec<Arc<dyn LiveDataServer>>,
        partitioner: Arc<dyn ServerPartitioner>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            servers,
            partitioner,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn num_servers(&self) -> usize {
        self.servers.len()
    }

    fn owner(&self, spec: &LiveDataSpecification) -> Option<usize> {
        self.partitioner
            .server_for(spec)
            .filter(|idx| *idx < self.servers.len())
    }

    fn partition(&self, specs: &[LiveDataSpecification]) -> Partitioned {
        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        let mut unowned = Vec::new();
        for (idx, spec) in specs.iter().enumerate() {
            match self.owner(spec) {
                Some(server) => groups.entry(server).or_default().push(idx),
                None => {
                    log::warn!("No server owns {}", spec);
                    unowned.push(idx);
                }
            }
        }
        Partitioned { groups, unowned }
    }

    async fn dispatch(
        &self,
        specs: &[LiveDataSpecification],
        snapshot: bool,
        persistent: bool,
    ) -> Vec<SubscriptionResponse> {
        let Partitioned { groups, unowned } = self.partition(specs);
        let mut responses: Vec<Option<SubscriptionResponse>> = vec![None; specs.len()];
        for idx in unowned {
            responses[idx] = Some(SubscriptionResponse::error(
                specs[idx].clone(),
                SubscriptionResult::InternalError,
                format!("No server available for {}", specs[idx]),
            ));
        }

        let results: Vec<(Vec<usize>, Result<Vec<SubscriptionResponse>>)> =
            stream::iter(groups)
                .map(|(server_idx, indices)| {
                    let server = self.servers[server_idx].clone();
                    let owned: Vec<LiveDataSpecification> =
                        indices.iter().map(|idx| specs[*idx].clone()).collect();
                    async move {
                        let result = if snapshot {
                            server.snapshot(&owned).await
                        } else {
                            server.subscribe(&owned, persistent).await
                        };
                        (indices, result)
                    }
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        for (indices, result) in results {
            match result {
                Ok(server_responses) if server_responses.len() == indices.len() => {
                    for (idx, response) in indices.into_iter().zip(server_responses) {
                        responses[idx] = Some(response);
                    }
                }
                Ok(server_responses) => {
                    log::error!(
                        "Underlying server returned {} responses for {} specifications",
                        server_responses.len(),
                        indices.len()
                    );
                    for idx in indices {
                        responses[idx] = Some(SubscriptionResponse::error(
                            specs[idx].clone(),
                            SubscriptionResult::InternalError,
                            "Mismatched response count from underlying server",
                        ));
                    }
                }
                Err(e) => {
                    log::error!("Underlying server failed: {}", e);
                    for idx in indices {
                        responses[idx] = Some(SubscriptionResponse::error(
                            specs[idx].clone(),
                            SubscriptionResult::InternalError,
                            e.to_string(),
                        ));
                    }
                }
            }
        }

        responses
            .into_iter()
            .zip(specs)
            .map(|(response, spec)| {
                response.unwrap_or_else(|| {
                    SubscriptionResponse::error(
                        spec.clone(),
                        SubscriptionResult::InternalError,
                        "No response from underlying server",
                    )
                })
            })
            .collect()
    }
}

#[async_trait]
impl LiveDataServer for CombiningLiveDataServer {
    /// Never fails as a whole; a failing underlying server turns into
    /// per-item errors for the specifications it owns
    async fn subscribe(
        &self,
        specs: &[LiveDataSpecification],
        persistent: bool,
    ) -> Result<Vec<SubscriptionResponse>> {
        Ok(self.dispatch(specs, false, persistent).await)
    }

    async fn snapshot(&self, specs: &[LiveDataSpecification]) -> Result<Vec<SubscriptionResponse>> {
        Ok(self.dispatch(specs, true, false).await)
    }

    async fn get_subscription(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<Subscription>> {
        let server = self.servers.get(self.owner(fully_qualified)?)?;
        server.get_subscription(fully_qualified).await
    }

    async fn get_market_data_distributor(
        &self,
        fully_qualified: &LiveDataSpecification,
    ) -> Option<Arc<MarketDataDistributor>> {
        let server = self.servers.get(self.owner(fully_qualified)?)?;
        server.get_market_data_distributor(fully_qualified).await
    }

    async fn get_market_data_distributors(
        &self,
        fully_qualified: &[LiveDataSpecification],
    ) -> HashMap<LiveDataSpecification, Arc<MarketDataDistributor>> {
        let Partitioned { groups, .. } = self.partition(fully_qualified);

        let maps: Vec<HashMap<LiveDataSpecification, Arc<MarketDataDistributor>>> =
            stream::iter(groups)
                .map(|(server_idx, indices)| {
                    let server = self.servers[server_idx].clone();
                    let owned: Vec<LiveDataSpecification> = indices
                        .iter()
                        .map(|idx| fully_qualified[*idx].clone())
                        .collect();
                    async move { server.get_market_data_distributors(&owned).await }
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        maps.into_iter().flatten().collect()
    }
}
