//! Tokio channel-based transport for single-process mode
//!
//! Broadcast channels give pub/sub semantics, mpsc plus oneshot gives
//! request/reply. Messages are passed by value without serialization.

use crate::error::TransportError;
use crate::transport::{Publisher, Requester, Subscriber};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Channel-based publisher bound to one subject
#[derive(Clone)]
pub struct ChannelPublisher<M> {
    subject: String,
    tx: broadcast::Sender<M>,
}

impl<M: Clone> ChannelPublisher<M> {
    /// Create a publisher/subscriber pair with given capacity
    pub fn pair(subject: impl Into<String>, capacity: usize) -> (Self, ChannelSubscriber<M>) {
        let (tx, rx) = broadcast::channel(capacity);
        (
            Self {
                subject: subject.into(),
                tx: tx.clone(),
            },
            ChannelSubscriber { rx, _tx: tx },
        )
    }

    /// Get another subscriber for this publisher
    pub fn subscribe(&self) -> ChannelSubscriber<M> {
        ChannelSubscriber {
            rx: self.tx.subscribe(),
            _tx: self.tx.clone(),
        }
    }

    /// Non-blocking publish usable from synchronous code.
    ///
    /// Returns the number of subscribers that received the message.
    pub fn publish_now(&self, msg: M) -> Result<usize, TransportError> {
        self.tx
            .send(msg)
            .map_err(|_| TransportError::NoSubscribers(self.subject.clone()))
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl<M> Publisher<M> for ChannelPublisher<M>
where
    M: Serialize + Clone + Send + Sync + 'static,
{
    fn subject(&self) -> &str {
        &self.subject
    }

    async fn publish(&self, msg: &M) -> Result<(), TransportError> {
        self.publish_now(msg.clone()).map(|_| ())
    }
}

/// Channel-based subscriber using broadcast receiver
pub struct ChannelSubscriber<M> {
    rx: broadcast::Receiver<M>,
    // Keeps the channel open while any subscriber lives
    _tx: broadcast::Sender<M>,
}

#[async_trait]
impl<M> Subscriber<M> for ChannelSubscriber<M>
where
    M: DeserializeOwned + Clone + Send + 'static,
{
    async fn next(&mut self) -> Result<M, TransportError> {
        loop {
            match self.rx.recv().await {
                Ok(msg) => return Ok(msg),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Subscriber lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(TransportError::ChannelClosed);
                }
            }
        }
    }

    fn try_next(&mut self) -> Result<Option<M>, TransportError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(_)) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(TransportError::ChannelClosed),
        }
    }
}

struct ChannelRequest<Req, Res> {
    request: Req,
    reply_tx: oneshot::Sender<Res>,
}

/// Channel-based requester (client side of request/reply)
pub struct ChannelRequester<Req, Res> {
    tx: mpsc::Sender<ChannelRequest<Req, Res>>,
}

impl<Req, Res> Clone for ChannelRequester<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<Req, Res> ChannelRequester<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Create a requester/responder pair
    pub fn pair(capacity: usize) -> (Self, ChannelResponder<Req, Res>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, ChannelResponder { rx })
    }

    async fn send_request(&self, request: Req) -> Result<oneshot::Receiver<Res>, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ChannelRequest { request, reply_tx })
            .await
            .map_err(|_| TransportError::ChannelClosed)?;
        Ok(reply_rx)
    }

    /// Like [`Requester::request`], but gives up after `timeout`
    pub async fn request_with_timeout(
        &self,
        request: Req,
        timeout: Duration,
    ) -> Result<Res, TransportError> {
        let reply_rx = self.send_request(request).await?;
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(reply) => reply.map_err(|_| TransportError::NoReply),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

#[async_trait]
impl<Req, Res> Requester<Req, Res> for ChannelRequester<Req, Res>
where
    Req: Serialize + Clone + Send + Sync + 'static,
    Res: DeserializeOwned + Send + 'static,
{
    async fn request(&self, req: &Req) -> Result<Res, TransportError> {
        let reply_rx = self.send_request(req.clone()).await?;
        reply_rx.await.map_err(|_| TransportError::NoReply)
    }
}

/// Channel-based responder (server side of request/reply)
pub struct ChannelResponder<Req, Res> {
    rx: mpsc::Receiver<ChannelRequest<Req, Res>>,
}

impl<Req, Res> ChannelResponder<Req, Res> {
    /// Receive the next request; `None` once every requester is dropped
    pub async fn next(&mut self) -> Option<(Req, oneshot::Sender<Res>)> {
        self.rx.recv().await.map(|req| (req.request, req.reply_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pubsub() {
        let (publisher, mut subscriber) = ChannelPublisher::<String>::pair("test", 10);

        publisher.publish(&"hello".to_string()).await.unwrap();

        let msg = subscriber.next().await.unwrap();
        assert_eq!(msg, "hello");
        assert_eq!(publisher.subject(), "test");
    }

    #[tokio::test]
    async fn test_publish_now_counts_subscribers() {
        let (publisher, _sub1) = ChannelPublisher::<i32>::pair("test", 10);
        let _sub2 = publisher.subscribe();

        assert_eq!(publisher.publish_now(42).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let (publisher, subscriber) = ChannelPublisher::<i32>::pair("ticks", 10);
        drop(subscriber);

        assert_eq!(
            publisher.publish_now(1),
            Err(TransportError::NoSubscribers("ticks".into()))
        );
    }

    #[tokio::test]
    async fn test_request_reply() {
        let (requester, mut responder) = ChannelRequester::<String, String>::pair(10);

        let handle = tokio::spawn(async move {
            if let Some((req, reply_tx)) = responder.next().await {
                let _ = reply_tx.send(format!("Echo: {}", req));
            }
        });

        let response = requester.request(&"test".to_string()).await.unwrap();
        assert_eq!(response, "Echo: test");

        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let (requester, mut responder) = ChannelRequester::<String, String>::pair(10);

        let handle = tokio::spawn(async move {
            // Hold the reply sender without answering
            let pending = responder.next().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(pending);
        });

        let result = requester
            .request_with_timeout("slow".to_string(), Duration::from_secs(1))
            .await;
        assert_eq!(result, Err(TransportError::Timeout));

        handle.abort();
    }

    #[tokio::test]
    async fn test_dropped_reply() {
        let (requester, mut responder) = ChannelRequester::<String, String>::pair(10);

        tokio::spawn(async move {
            let _ = responder.next().await;
        });

        let result = requester.request(&"ignored".to_string()).await;
        assert_eq!(result, Err(TransportError::NoReply));
    }
}
