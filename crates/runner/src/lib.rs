//! Live Data Node
//!
//! Runs a standard live data server against a simulated upstream feed:
//!
//! - **Feed**: seeded random walk behind the upstream provider port
//! - **Pump**: tokio task pushing ticks for subscribed tickers
//! - **Node**: bootstrap from JSON config, receivers over in-process channels
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────┐  ticks   ┌──────────────────────────┐
//!   │ SimulatedFeedProvider│◄─────────│        FeedPump          │
//!   │   (random walk)      │          └────────────┬─────────────┘
//!   └──────────▲───────────┘                       │ live_data_received
//!              │ do_subscribe / do_snapshot        ▼
//!              │                      ┌──────────────────────────┐
//!              └──────────────────────│  StandardLiveDataServer  │
//!                                     └──┬──────────▲─────────▲──┘
//!                         TickMessage    │          │         │
//!                   ◄────────────────────┘          │         │
//!                   SubscriptionRequest ────────────┘         │
//!                   Heartbeat ────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod node;
pub mod pump;

// Re-export main types
pub use config::{FeedConfig, RunnerConfig};
pub use error::{Result, RunnerError};
pub use feed::{RandomWalk, SimulatedFeedProvider};
pub use node::{LiveDataNode, NodeStats, standard_rule_set};
pub use pump::FeedPump;
