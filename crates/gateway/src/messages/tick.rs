//! Tick envelope

use livedata_core::LiveDataValueUpdate;
use serde::{Deserialize, Serialize};

/// A normalized update tagged with the subject it was published on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickMessage {
    pub subject: String,
    pub update: LiveDataValueUpdate,
}

impl TickMessage {
    pub fn new(subject: impl Into<String>, update: LiveDataValueUpdate) -> Self {
        Self {
            subject: subject.into(),
            update,
        }
    }
}
