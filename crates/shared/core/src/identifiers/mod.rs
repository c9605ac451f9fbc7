//! Identifiers for market data series

mod external_id;
mod specification;

pub use external_id::{ExternalId, ExternalIdBundle, ExternalScheme};
pub use specification::LiveDataSpecification;
