//! Transport configuration

/// Logical subject names used by the live data server
pub struct Subjects;

impl Subjects {
    /// Prefix every tick distribution target starts with
    pub const TICK_PREFIX: &'static str = "LiveData";

    /// Tick topic for a distribution target: `LiveData.SIM~FOO`
    pub fn ticks(target: &str) -> String {
        if target.starts_with(Self::TICK_PREFIX) {
            target.to_string()
        } else {
            format!("{}.{}", Self::TICK_PREFIX, target)
        }
    }

    /// Subscription request/reply channel
    pub const SUBSCRIPTION_REQUESTS: &'static str = "LiveData.Subscription";

    /// Entitlement request/reply channel
    pub const ENTITLEMENT_REQUESTS: &'static str = "LiveData.Entitlement";

    /// Client heartbeats
    pub const HEARTBEAT: &'static str = "LiveData.Heartbeat";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_subjects() {
        assert_eq!(Subjects::ticks("SIM~FOO"), "LiveData.SIM~FOO");
        assert_eq!(Subjects::ticks("LiveData.SIM~FOO"), "LiveData.SIM~FOO");
    }
}
