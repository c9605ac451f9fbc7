use livedata_core::{SubscriptionRequest, SubscriptionResponseMsg};
use livedata_gateway::ChannelResponder;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::server::StandardLiveDataServer;

/// Request/reply endpoint for client subscription requests
#[derive(Clone)]
pub struct SubscriptionRequestReceiver {
    server: Arc<StandardLiveDataServer>,
}

impl SubscriptionRequestReceiver {
    pub fn new(server: Arc<StandardLiveDataServer>) -> Self {
        Self { server }
    }

    pub async fn request_received(&self, request: &SubscriptionRequest) -> SubscriptionResponseMsg {
        self.server.subscription_request_made(request).await
    }

    /// Answer requests until every requester is gone
    pub fn spawn(
        self,
        mut responder: ChannelResponder<SubscriptionRequest, SubscriptionResponseMsg>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some((request, reply)) = responder.next().await {
                let response = self.request_received(&request).await;
                if reply.send(response).is_err() {
                    log::warn!("Requester from {} went away before the reply", request.user);
                }
            }
            log::info!("Subscription request channel closed");
        })
    }
}
