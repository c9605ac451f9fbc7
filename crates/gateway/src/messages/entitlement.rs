//! Entitlement request/reply messages

use livedata_core::{LiveDataSpecification, UserPrincipal};
use serde::{Deserialize, Serialize};

/// Ask whether `user` may see each of `specifications`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRequest {
    pub user: UserPrincipal,
    pub specifications: Vec<LiveDataSpecification>,
}

impl EntitlementRequest {
    pub fn new(user: UserPrincipal, specifications: Vec<LiveDataSpecification>) -> Self {
        Self {
            user,
            specifications,
        }
    }
}

/// One answer per requested specification, in request order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementResponse {
    pub entitlements: Vec<(LiveDataSpecification, bool)>,
}

impl EntitlementResponse {
    pub fn is_entitled(&self, spec: &LiveDataSpecification) -> Option<bool> {
        self.entitlements
            .iter()
            .find(|(s, _)| s == spec)
            .map(|(_, entitled)| *entitled)
    }
}
