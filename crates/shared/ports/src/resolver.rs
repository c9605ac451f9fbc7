use livedata_core::{DistributionSpecification, LiveDataSpecification};
use std::collections::HashMap;

use crate::error::ResolutionResult;

/// Port mapping requested specifications to how they are distributed
///
/// Partial answers are allowed: a specification missing from the returned
/// map could not be resolved and is reported back as not present.
pub trait DistributionSpecificationResolver: Send + Sync {
    fn resolve(
        &self,
        specs: &[LiveDataSpecification],
    ) -> ResolutionResult<HashMap<LiveDataSpecification, DistributionSpecification>>;
}
