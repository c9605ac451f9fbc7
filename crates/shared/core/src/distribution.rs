//! Distribution specification: how one resolved series is published

use crate::fields::{FieldContainer, FieldHistoryStore};
use crate::identifiers::LiveDataSpecification;
use crate::normalization::NormalizationRuleSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A fully-qualified specification paired with the topic its ticks go out
/// on and the normalization pipeline applied before publishing.
///
/// Identity is the fully-qualified specification, the rule set id and the
/// distribution target; the rule objects themselves are not compared.
#[derive(Clone)]
pub struct DistributionSpecification {
    fully_qualified_specification: LiveDataSpecification,
    normalization_rule_set: Arc<NormalizationRuleSet>,
    tick_distribution_target: String,
}

impl DistributionSpecification {
    pub fn new(
        fully_qualified_specification: LiveDataSpecification,
        normalization_rule_set: Arc<NormalizationRuleSet>,
        tick_distribution_target: impl Into<String>,
    ) -> Self {
        Self {
            fully_qualified_specification,
            normalization_rule_set,
            tick_distribution_target: tick_distribution_target.into(),
        }
    }

    pub fn fully_qualified_specification(&self) -> &LiveDataSpecification {
        &self.fully_qualified_specification
    }

    pub fn normalization_rule_set(&self) -> &NormalizationRuleSet {
        &self.normalization_rule_set
    }

    /// Topic/channel name the normalized ticks are published on
    pub fn tick_distribution_target(&self) -> &str {
        &self.tick_distribution_target
    }

    /// Normalize a raw message for this distribution
    pub fn normalized_message(
        &self,
        msg: &FieldContainer,
        raw_id: &str,
        history: &FieldHistoryStore,
    ) -> Option<FieldContainer> {
        self.normalization_rule_set.normalize(raw_id, msg, history)
    }

    fn key(&self) -> (&LiveDataSpecification, &str, &str) {
        (
            &self.fully_qualified_specification,
            self.normalization_rule_set.id(),
            &self.tick_distribution_target,
        )
    }
}

impl PartialEq for DistributionSpecification {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DistributionSpecification {}

impl Hash for DistributionSpecification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for DistributionSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionSpecification")
            .field("fully_qualified", &self.fully_qualified_specification.to_string())
            .field("rule_set", &self.normalization_rule_set.id())
            .field("target", &self.tick_distribution_target)
            .finish()
    }
}

impl fmt::Display for DistributionSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.fully_qualified_specification, self.tick_distribution_target
        )
    }
}
