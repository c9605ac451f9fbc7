use crate::fields::{FieldContainer, FieldHistoryStore};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

/// One step of a normalization pipeline
pub trait NormalizationRule: Debug + Send + Sync {
    /// Transform `msg`, or return `None` to drop it
    fn apply(
        &self,
        raw_id: &str,
        msg: FieldContainer,
        history: &FieldHistoryStore,
    ) -> Option<FieldContainer>;
}

/// Keeps only the listed fields
#[derive(Debug, Clone)]
pub struct FieldFilter {
    fields: BTreeSet<String>,
}

impl FieldFilter {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl NormalizationRule for FieldFilter {
    fn apply(
        &self,
        _raw_id: &str,
        msg: FieldContainer,
        _history: &FieldHistoryStore,
    ) -> Option<FieldContainer> {
        let mut filtered = FieldContainer::new();
        for (name, value) in msg.iter() {
            if self.fields.contains(name) {
                filtered.insert(name, value.clone());
            }
        }
        Some(filtered)
    }
}

/// Renames fields from provider names to published names
#[derive(Debug, Clone)]
pub struct FieldNameChange {
    renames: HashMap<String, String>,
}

impl FieldNameChange {
    pub fn new<I, S>(renames: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            renames: renames
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }
}

impl NormalizationRule for FieldNameChange {
    fn apply(
        &self,
        _raw_id: &str,
        msg: FieldContainer,
        _history: &FieldHistoryStore,
    ) -> Option<FieldContainer> {
        let mut renamed = FieldContainer::new();
        for (name, value) in msg.iter() {
            let target = self.renames.get(name).map(String::as_str).unwrap_or(name);
            renamed.insert(target, value.clone());
        }
        Some(renamed)
    }
}

/// Drops the message unless every required field is known, either in the
/// message itself or in the feed's history
#[derive(Debug, Clone)]
pub struct RequiredFieldFilter {
    required: BTreeSet<String>,
}

impl RequiredFieldFilter {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl NormalizationRule for RequiredFieldFilter {
    fn apply(
        &self,
        _raw_id: &str,
        msg: FieldContainer,
        history: &FieldHistoryStore,
    ) -> Option<FieldContainer> {
        let all_known = self
            .required
            .iter()
            .all(|f| msg.has_field(f) || history.last_known().has_field(f));
        all_known.then_some(msg)
    }
}
