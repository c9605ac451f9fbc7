//! Default entitlement checkers

use livedata_core::{LiveDataSpecification, UserPrincipal};
use livedata_ports::{EntitlementChecker, EntitlementResult};
use std::collections::{HashMap, HashSet};

/// Entitles everyone to everything
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveEntitlementChecker;

impl EntitlementChecker for PermissiveEntitlementChecker {
    fn is_entitled(
        &self,
        _user: &UserPrincipal,
        specs: &[LiveDataSpecification],
    ) -> EntitlementResult<HashMap<LiveDataSpecification, bool>> {
        Ok(specs.iter().map(|spec| (spec.clone(), true)).collect())
    }
}

/// Denies a fixed set of users, entitles everyone else
#[derive(Debug, Default, Clone)]
pub struct UserDenyListEntitlementChecker {
    denied_users: HashSet<String>,
}

impl UserDenyListEntitlementChecker {
    pub fn new<I, S>(denied_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denied_users: denied_users.into_iter().map(Into::into).collect(),
        }
    }
}

impl EntitlementChecker for UserDenyListEntitlementChecker {
    fn is_entitled(
        &self,
        user: &UserPrincipal,
        specs: &[LiveDataSpecification],
    ) -> EntitlementResult<HashMap<LiveDataSpecification, bool>> {
        let entitled = !self.denied_users.contains(&user.user_name);
        Ok(specs.iter().map(|spec| (spec.clone(), entitled)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedata_core::ExternalId;

    #[test]
    fn test_deny_list() {
        let checker = UserDenyListEntitlementChecker::new(["mallory"]);
        let spec = LiveDataSpecification::of("R", ExternalId::of("SIM", "FOO"));

        let denied = checker
            .is_entitled(&UserPrincipal::local("mallory"), &[spec.clone()])
            .unwrap();
        assert_eq!(denied[&spec], false);

        let allowed = checker
            .is_entitled(&UserPrincipal::local("alice"), &[spec.clone()])
            .unwrap();
        assert_eq!(allowed[&spec], true);
    }
}
