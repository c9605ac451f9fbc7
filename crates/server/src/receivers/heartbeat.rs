use livedata_gateway::{Heartbeat, Subscriber, TransportError};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::expiration::HeartbeatOutcome;
use crate::server::StandardLiveDataServer;

/// Feeds client heartbeats into the expiration manager
#[derive(Clone)]
pub struct HeartbeatReceiver {
    server: Arc<StandardLiveDataServer>,
}

impl HeartbeatReceiver {
    pub fn new(server: Arc<StandardLiveDataServer>) -> Self {
        Self { server }
    }

    pub async fn heartbeat_received(&self, heartbeat: &Heartbeat) -> HeartbeatOutcome {
        log::debug!(
            "Heartbeat for {} specifications",
            heartbeat.specifications.len()
        );
        self.server
            .expiration_manager()
            .extend_publication_timeout(&heartbeat.specifications)
            .await
    }

    /// Consume heartbeats until the channel closes
    pub fn spawn<S>(self, mut subscriber: S) -> JoinHandle<()>
    where
        S: Subscriber<Heartbeat> + 'static,
    {
        tokio::spawn(async move {
            loop {
                match subscriber.next().await {
                    Ok(heartbeat) => {
                        self.heartbeat_received(&heartbeat).await;
                    }
                    Err(TransportError::ChannelClosed) => {
                        log::info!("Heartbeat channel closed");
                        break;
                    }
                    Err(e) => log::warn!("Heartbeat receive failed: {}", e),
                }
            }
        })
    }
}
