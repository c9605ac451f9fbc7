//! Live Data Core Domain
//!
//! Pure value types for the live data distribution server.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod distribution;
pub mod fields;
pub mod identifiers;
pub mod messages;
pub mod normalization;
pub mod values;

// Re-export commonly used types at crate root
pub use distribution::DistributionSpecification;
pub use fields::{FieldContainer, FieldHistoryStore, FieldValue};
pub use identifiers::{ExternalId, ExternalIdBundle, ExternalScheme, LiveDataSpecification};
pub use messages::{
    LIVE_DATA_PERMISSION_DENIED_FIELD, LiveDataValueUpdate, SubscriptionRequest,
    SubscriptionResponse, SubscriptionResponseMsg, SubscriptionResult, SubscriptionType,
    UserPrincipal,
};
pub use normalization::{
    FieldFilter, FieldNameChange, NormalizationRule, NormalizationRuleSet, RequiredFieldFilter,
    StandardRules,
};
pub use values::{RawId, Timestamp};
