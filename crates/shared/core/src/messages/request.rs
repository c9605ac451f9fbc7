use crate::identifiers::LiveDataSpecification;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The user on whose behalf a request is made
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPrincipal {
    pub user_name: String,
    pub ip_address: String,
}

impl UserPrincipal {
    pub fn new(user_name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ip_address: ip_address.into(),
        }
    }

    /// Principal for requests originating inside the server process
    pub fn local(user_name: impl Into<String>) -> Self {
        Self::new(user_name, "127.0.0.1")
    }
}

impl fmt::Display for UserPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user_name, self.ip_address)
    }
}

/// Kind of interest a client expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionType {
    /// Live until heartbeats stop arriving
    NonPersistent,
    /// Live until explicitly made non-persistent and stopped
    Persistent,
    /// One-off image, no subscription
    Snapshot,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonPersistent => "non_persistent",
            Self::Persistent => "persistent",
            Self::Snapshot => "snapshot",
        }
    }
}

/// A client request to subscribe to, or snapshot, a batch of specifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub user: UserPrincipal,
    pub subscription_type: SubscriptionType,
    pub specifications: Vec<LiveDataSpecification>,
}

impl SubscriptionRequest {
    pub fn new(
        user: UserPrincipal,
        subscription_type: SubscriptionType,
        specifications: Vec<LiveDataSpecification>,
    ) -> Self {
        Self {
            user,
            subscription_type,
            specifications,
        }
    }
}
