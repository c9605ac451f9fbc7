//! Wire message types for gateway communication
//!
//! Subscription requests and responses travel as the core message types;
//! the types here are gateway-only envelopes.

pub mod entitlement;
pub mod heartbeat;
pub mod tick;

pub use entitlement::{EntitlementRequest, EntitlementResponse};
pub use heartbeat::Heartbeat;
pub use tick::TickMessage;
