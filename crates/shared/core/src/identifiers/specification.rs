use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ExternalId, ExternalIdBundle, ExternalScheme};

/// What a client asks for: a set of identifiers plus the normalization
/// rule set the values should be published under.
///
/// Used as a map key everywhere in the server, so equality and hashing are
/// structural over both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LiveDataSpecification {
    pub normalization_rule_set_id: String,
    pub identifiers: ExternalIdBundle,
}

impl LiveDataSpecification {
    pub fn new(normalization_rule_set_id: impl Into<String>, identifiers: ExternalIdBundle) -> Self {
        Self {
            normalization_rule_set_id: normalization_rule_set_id.into(),
            identifiers,
        }
    }

    /// Specification for a single identifier
    pub fn of(normalization_rule_set_id: impl Into<String>, id: ExternalId) -> Self {
        Self::new(normalization_rule_set_id, ExternalIdBundle::of(id))
    }

    /// The identifier value in `scheme`, if present
    pub fn identifier(&self, scheme: &ExternalScheme) -> Option<&str> {
        self.identifiers.get_value(scheme)
    }
}

impl fmt::Display for LiveDataSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.normalization_rule_set_id, self.identifiers)
    }
}
