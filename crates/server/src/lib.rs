//! Live Data Server
//!
//! Accepts subscriptions to external market data, keeps them alive against
//! an upstream provider, normalizes and fans out raw ticks, and expires the
//! ones clients stop heartbeating.
//!
//! ## Architecture
//!
//! ```text
//!                         ┌──────────────────────────────────────────┐
//!  subscribe / snapshot ─►│          StandardLiveDataServer          │
//!  (via request handler)  │  resolve ─► entitle ─► registry (locked) │
//!                         │      raw id ─► Subscription              │
//!  heartbeats ───────────►│      fq spec ─► MarketDataDistributor    │
//!  (ExpirationManager)    └──────────┬──────────────────▲────────────┘
//!                                    │ do_subscribe     │ live_data_received
//!                                    ▼ do_snapshot      │ (lock-free lookup)
//!                              UpstreamProvider ────────┘
//!
//!  Subscription ──► Distributor (rule set A) ──► senders ──► LiveData.{target}
//!               └─► Distributor (rule set B) ──► senders ──► LiveData.{target}
//! ```
//!
//! [`CombiningLiveDataServer`] puts several servers behind the same
//! [`LiveDataServer`] interface.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let server = StandardLiveDataServer::builder(provider, resolver)
//!     .with_sender_factory(Arc::new(sender_factory))
//!     .with_config(config)
//!     .build();
//! server.start().await?;
//!
//! let responses = server.subscribe(&[spec], false).await?;
//! server.live_data_received("FOO", &fields);
//! ```

pub mod combining;
pub mod config;
pub mod distributor;
pub mod entitlement;
pub mod error;
pub mod expiration;
pub mod facade;
pub mod hooks;
pub mod listener;
pub mod performance;
pub mod provider;
pub mod receivers;
mod registry;
mod request;
pub mod resolver;
pub mod server;
mod snapshot;
mod subscribe;
pub mod subscription;
pub mod trace;

// Re-export main types
pub use combining::{CombiningLiveDataServer, ServerPartitioner};
pub use config::{CombiningConfig, ConfigError, ExpirationConfig, LiveDataServerConfig};
pub use distributor::MarketDataDistributor;
pub use entitlement::{PermissiveEntitlementChecker, UserDenyListEntitlementChecker};
pub use error::{Error, ListenerError, ProviderError, Result};
pub use expiration::{ExpirationManager, HeartbeatOutcome};
pub use facade::LiveDataServer;
pub use hooks::{NoOpSubscriptionHooks, SubscriptionHooks};
pub use listener::{ListenerSet, SubscriptionListener};
pub use performance::PerformanceCounter;
pub use provider::{SubscriptionHandle, UpstreamProvider};
pub use receivers::{EntitlementServer, HeartbeatReceiver, SubscriptionRequestReceiver};
pub use resolver::NaiveDistributionSpecificationResolver;
pub use server::{ConnectionStatus, LiveDataServerBuilder, StandardLiveDataServer};
pub use subscription::Subscription;
pub use trace::{DistributorTrace, SubscriptionTrace};
