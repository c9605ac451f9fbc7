use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Namespace of an external identifier (e.g. a ticker scheme of one provider)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalScheme(pub String);

impl ExternalScheme {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExternalScheme {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An identifier qualified by its scheme: `Scheme~Value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId {
    pub scheme: ExternalScheme,
    pub value: String,
}

impl ExternalId {
    pub fn of(scheme: impl Into<ExternalScheme>, value: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            value: value.into(),
        }
    }

    pub fn is_scheme(&self, scheme: &ExternalScheme) -> bool {
        &self.scheme == scheme
    }
}

impl From<String> for ExternalScheme {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.scheme, self.value)
    }
}

/// An ordered set of external identifiers that all refer to the same thing
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalIdBundle(BTreeSet<ExternalId>);

impl ExternalIdBundle {
    pub fn new(ids: impl IntoIterator<Item = ExternalId>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn of(id: ExternalId) -> Self {
        Self::new([id])
    }

    /// Value of the first identifier in `scheme`, if the bundle has one
    pub fn get_value(&self, scheme: &ExternalScheme) -> Option<&str> {
        self.0
            .iter()
            .find(|id| id.is_scheme(scheme))
            .map(|id| id.value.as_str())
    }

    pub fn contains(&self, id: &ExternalId) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternalId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this bundle with `id` added
    pub fn with(&self, id: ExternalId) -> Self {
        let mut ids = self.0.clone();
        ids.insert(id);
        Self(ids)
    }
}

impl fmt::Display for ExternalIdBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}
