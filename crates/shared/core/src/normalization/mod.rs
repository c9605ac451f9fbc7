//! Normalization of raw provider fields into a published field set
//!
//! A rule set is an ordered pipeline of rules. Any rule can drop the
//! message entirely, which suppresses publication for that tick.

mod rule_set;
mod rules;

pub use rule_set::{NormalizationRuleSet, StandardRules};
pub use rules::{FieldFilter, FieldNameChange, NormalizationRule, RequiredFieldFilter};
