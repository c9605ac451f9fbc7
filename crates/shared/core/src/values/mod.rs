use chrono::{DateTime, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifier of a security as understood by the upstream market data provider
pub type RawId = String;
