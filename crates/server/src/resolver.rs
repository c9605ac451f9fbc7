//! Default distribution specification resolver

use livedata_core::{
    DistributionSpecification, LiveDataSpecification, NormalizationRuleSet, StandardRules,
};
use livedata_gateway::Subjects;
use livedata_ports::{DistributionSpecificationResolver, ResolutionResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Treats every requested specification as already fully qualified.
///
/// The rule set is looked up by the requested id; an unknown id leaves the
/// specification unresolved. Ticks go out on `LiveData.<specification>`.
#[derive(Debug, Clone)]
pub struct NaiveDistributionSpecificationResolver {
    rule_sets: HashMap<String, Arc<NormalizationRuleSet>>,
}

impl Default for NaiveDistributionSpecificationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveDistributionSpecificationResolver {
    /// Knows only the pass-through rule set
    pub fn new() -> Self {
        Self {
            rule_sets: HashMap::new(),
        }
        .with_rule_set(StandardRules::no_normalization())
    }

    pub fn with_rule_set(mut self, rule_set: NormalizationRuleSet) -> Self {
        self.rule_sets
            .insert(rule_set.id().to_string(), Arc::new(rule_set));
        self
    }

    pub fn rule_set(&self, id: &str) -> Option<&Arc<NormalizationRuleSet>> {
        self.rule_sets.get(id)
    }
}

impl DistributionSpecificationResolver for NaiveDistributionSpecificationResolver {
    fn resolve(
        &self,
        specs: &[LiveDataSpecification],
    ) -> ResolutionResult<HashMap<LiveDataSpecification, DistributionSpecification>> {
        let mut resolved = HashMap::with_capacity(specs.len());
        for spec in specs {
            match self.rule_sets.get(&spec.normalization_rule_set_id) {
                Some(rule_set) => {
                    let distribution = DistributionSpecification::new(
                        spec.clone(),
                        rule_set.clone(),
                        Subjects::ticks(&spec.to_string()),
                    );
                    resolved.insert(spec.clone(), distribution);
                }
                None => log::debug!(
                    "No normalization rule set {} for {}",
                    spec.normalization_rule_set_id,
                    spec
                ),
            }
        }
        Ok(resolved)
    }
}
