use super::{LiveDataValueUpdate, UserPrincipal};
use crate::identifiers::LiveDataSpecification;
use serde::{Deserialize, Serialize};

/// Outcome of one requested specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionResult {
    Success,
    /// Nothing distributable could be resolved for the request
    NotPresent,
    /// Entitlement check or upstream permission denial
    NotAuthorized,
    InternalError,
}

impl SubscriptionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NotPresent => "NOT_PRESENT",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Per-specification response to a subscribe or snapshot request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub requested_specification: LiveDataSpecification,
    pub result: SubscriptionResult,
    pub user_message: Option<String>,
    pub fully_qualified_specification: Option<LiveDataSpecification>,
    pub tick_distribution_specification: Option<String>,
    pub snapshot: Option<LiveDataValueUpdate>,
}

impl SubscriptionResponse {
    /// Successful subscription, pointing the client at the distribution target
    pub fn success(
        requested: LiveDataSpecification,
        fully_qualified: LiveDataSpecification,
        tick_distribution_target: impl Into<String>,
    ) -> Self {
        Self {
            requested_specification: requested,
            result: SubscriptionResult::Success,
            user_message: None,
            fully_qualified_specification: Some(fully_qualified),
            tick_distribution_specification: Some(tick_distribution_target.into()),
            snapshot: None,
        }
    }

    /// Successful snapshot carrying its value
    pub fn snapshot(requested: LiveDataSpecification, snapshot: LiveDataValueUpdate) -> Self {
        Self {
            requested_specification: requested,
            result: SubscriptionResult::Success,
            user_message: None,
            fully_qualified_specification: Some(snapshot.specification.clone()),
            tick_distribution_specification: None,
            snapshot: Some(snapshot),
        }
    }

    pub fn error(
        requested: LiveDataSpecification,
        result: SubscriptionResult,
        message: impl Into<String>,
    ) -> Self {
        Self {
            requested_specification: requested,
            result,
            user_message: Some(message.into()),
            fully_qualified_specification: None,
            tick_distribution_specification: None,
            snapshot: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == SubscriptionResult::Success
    }
}

/// Responses to a whole `SubscriptionRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResponseMsg {
    pub user: UserPrincipal,
    pub responses: Vec<SubscriptionResponse>,
}

impl SubscriptionResponseMsg {
    pub fn new(user: UserPrincipal, responses: Vec<SubscriptionResponse>) -> Self {
        Self { user, responses }
    }
}
