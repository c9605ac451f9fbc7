//! Live Data Gateway
//!
//! Gateway layer between the live data server and its clients. Provides:
//! - Transport abstraction (tokio channels, with traits for future transports)
//! - Wire message types for heartbeats, entitlement checks and ticks
//! - A channel-backed `MarketDataSender` for publishing normalized ticks
//!
//! ## Architecture
//!
//! ```text
//!  Clients ──subscription requests──► ┌─────────┐
//!          ──heartbeats─────────────► │ Gateway │ ──► Live data server
//!          ──entitlement requests───► │         │
//!          ◄──ticks.{target}───────── └─────────┘ ◄── distributors
//! ```
//!
//! ## Transport
//!
//! Currently uses tokio channels for single-process operation.
//! The `Publisher`/`Subscriber`/`Requester` traits allow plugging in other
//! transports (JMS-style brokers, NATS, etc.) when needed.

pub mod adapters;
pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use adapters::{ChannelMarketDataSender, ChannelSenderFactory};
pub use error::TransportError;
pub use messages::{EntitlementRequest, EntitlementResponse, Heartbeat, TickMessage};
pub use transport::{
    Publisher, Requester, Subjects, Subscriber,
    channel::{ChannelPublisher, ChannelRequester, ChannelResponder, ChannelSubscriber},
};
