//! Heartbeat message

use livedata_core::LiveDataSpecification;
use serde::{Deserialize, Serialize};

/// Periodic "still interested" signal from a client, listing the
/// fully-qualified specifications it believes it is subscribed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub specifications: Vec<LiveDataSpecification>,
}

impl Heartbeat {
    pub fn new(specifications: Vec<LiveDataSpecification>) -> Self {
        Self { specifications }
    }

    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}
