use chrono::Utc;
use livedata_core::Timestamp;
use livedata_ports::Clock;
use std::sync::Arc;

/// Wall-clock time; what a running server uses for expiry and creation times
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }

    /// Shared handle, the form the server takes its clock in
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
