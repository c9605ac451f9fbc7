//! Transport abstraction layer
//!
//! Message passing over tokio channels behind traits, so a broker-backed
//! transport can replace the in-process one without touching the server.

pub mod channel;
pub mod config;

pub use config::Subjects;

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Publisher - sends messages on a subject
#[async_trait]
pub trait Publisher<M>: Send + Sync
where
    M: Serialize + Send + Sync,
{
    /// Subject this publisher is bound to
    fn subject(&self) -> &str;

    async fn publish(&self, msg: &M) -> Result<(), TransportError>;
}

/// Subscriber - receives messages from a subject
#[async_trait]
pub trait Subscriber<M>: Send
where
    M: DeserializeOwned + Send,
{
    /// Wait for the next message
    async fn next(&mut self) -> Result<M, TransportError>;

    /// Try to receive without blocking (returns None if no message available)
    fn try_next(&mut self) -> Result<Option<M>, TransportError>;
}

/// Request/Reply pattern (subscription requests, entitlement checks)
#[async_trait]
pub trait Requester<Req, Res>: Send + Sync
where
    Req: Serialize + Send + Sync,
    Res: DeserializeOwned + Send,
{
    async fn request(&self, req: &Req) -> Result<Res, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_publisher_object_safe(_: &dyn Publisher<String>) {}
    fn _assert_subscriber_object_safe(_: &mut dyn Subscriber<String>) {}
    fn _assert_requester_object_safe(_: &dyn Requester<String, String>) {}
}
