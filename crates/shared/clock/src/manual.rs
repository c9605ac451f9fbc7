use chrono::{Duration, Utc};
use livedata_core::Timestamp;
use livedata_ports::Clock;
use parking_lot::RwLock;
use std::sync::Arc;

/// Clock whose time only changes through `advance` or `set_time`
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a new manual clock
    ///
    /// # Arguments
    /// * `initial_time` - Optional starting time. If None, uses current wall time.
    pub fn new(initial_time: Option<Timestamp>) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time.unwrap_or_else(Utc::now)),
        })
    }

    /// Move time forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.write();
        *current += duration;
    }

    /// Explicitly set the time
    ///
    /// Warning: This can move time backwards. Use with caution.
    pub fn set_time(&self, time: Timestamp) {
        *self.current_time.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_is_frozen_until_advanced() {
        let clock = ManualClock::new(None);
        let time1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(clock.now(), time1);

        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now() - time1, Duration::seconds(30));
    }

    #[test]
    fn test_set_time() {
        let start = Utc::now();
        let clock = ManualClock::new(Some(start));
        let target = start + Duration::hours(1);

        clock.set_time(target);
        assert_eq!(clock.now(), target);
    }
}
