use livedata_core::{LiveDataSpecification, UserPrincipal};
use std::collections::HashMap;

use crate::error::EntitlementResult;

/// Port deciding whether a user may see market data
pub trait EntitlementChecker: Send + Sync {
    /// One entry per requested specification
    fn is_entitled(
        &self,
        user: &UserPrincipal,
        specs: &[LiveDataSpecification],
    ) -> EntitlementResult<HashMap<LiveDataSpecification, bool>>;
}
