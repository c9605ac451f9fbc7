use super::NormalizationRule;
use crate::fields::{FieldContainer, FieldHistoryStore};
use std::fmt;
use std::sync::Arc;

/// An identified, ordered pipeline of normalization rules
#[derive(Clone)]
pub struct NormalizationRuleSet {
    id: String,
    rules: Vec<Arc<dyn NormalizationRule>>,
}

impl NormalizationRuleSet {
    pub fn new(id: impl Into<String>, rules: Vec<Arc<dyn NormalizationRule>>) -> Self {
        Self {
            id: id.into(),
            rules,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run every rule in order. `None` if a rule drops the message or
    /// nothing is left at the end.
    pub fn normalize(
        &self,
        raw_id: &str,
        msg: &FieldContainer,
        history: &FieldHistoryStore,
    ) -> Option<FieldContainer> {
        let mut current = msg.clone();
        for rule in &self.rules {
            current = rule.apply(raw_id, current, history)?;
        }
        (!current.is_empty()).then_some(current)
    }
}

impl fmt::Debug for NormalizationRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizationRuleSet")
            .field("id", &self.id)
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Well-known rule sets
pub struct StandardRules;

impl StandardRules {
    /// Id of the default rule set clients ask for
    pub const OPENGAMMA_RULE_SET_ID: &'static str = "OpenGamma";

    /// Id of the pass-through rule set
    pub const NO_NORMALIZATION_ID: &'static str = "No Normalization";

    /// Pass-through rule set
    pub fn no_normalization() -> NormalizationRuleSet {
        NormalizationRuleSet::new(Self::NO_NORMALIZATION_ID, Vec::new())
    }
}
