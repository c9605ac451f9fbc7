//! Live Data Ports
//!
//! Port definitions (traits) for the live data server.
//! These define the boundaries between the server and its collaborators.

mod clock;
mod entitlement;
mod error;
mod resolver;
mod sender;

pub use clock::Clock;
pub use entitlement::EntitlementChecker;
pub use error::{EntitlementError, EntitlementResult, ResolutionError, ResolutionResult};
pub use resolver::DistributionSpecificationResolver;
pub use sender::{EmptyMarketDataSenderFactory, MarketDataSender, MarketDataSenderFactory};
