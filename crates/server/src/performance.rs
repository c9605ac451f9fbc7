//! Sliding-window hit counter for the tick path

use livedata_core::Timestamp;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Counts hits in one-second buckets over the last `window_secs` seconds
pub struct PerformanceCounter {
    window_secs: i64,
    buckets: Mutex<VecDeque<(i64, u64)>>,
}

impl PerformanceCounter {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs: i64::try_from(window_secs.max(1)).unwrap_or(i64::MAX),
            buckets: Mutex::new(VecDeque::new()),
        }
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    pub fn hit(&self, now: Timestamp) {
        let second = now.timestamp();
        let mut buckets = self.buckets.lock();
        match buckets.back_mut() {
            Some((bucket, hits)) if *bucket == second => *hits += 1,
            _ => buckets.push_back((second, 1)),
        }
        Self::evict(&mut buckets, second, self.window_secs);
    }

    /// Mean hits per second over the window ending at `now`
    pub fn hits_per_second(&self, now: Timestamp) -> f64 {
        let second = now.timestamp();
        let mut buckets = self.buckets.lock();
        Self::evict(&mut buckets, second, self.window_secs);
        let total: u64 = buckets.iter().map(|(_, hits)| hits).sum();
        total as f64 / self.window_secs as f64
    }

    fn evict(buckets: &mut VecDeque<(i64, u64)>, now_second: i64, window_secs: i64) {
        while let Some((bucket, _)) = buckets.front() {
            if *bucket <= now_second - window_secs {
                buckets.pop_front();
            } else {
                break;
            }
        }
    }
}
