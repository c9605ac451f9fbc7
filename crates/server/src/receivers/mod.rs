//! Transport-facing receivers
//!
//! Each receiver wraps one server capability and can be driven directly or
//! spawned as a tokio task over a gateway channel.

mod entitlement;
mod heartbeat;
mod subscription;

pub use entitlement::EntitlementServer;
pub use heartbeat::HeartbeatReceiver;
pub use subscription::SubscriptionRequestReceiver;
