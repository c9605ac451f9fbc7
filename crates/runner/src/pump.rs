//! Feed pump: drives simulated ticks into the server

use livedata_server::StandardLiveDataServer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::feed::SimulatedFeedProvider;

/// Background task pushing one update per subscribed ticker every interval
pub struct FeedPump {
    task: JoinHandle<()>,
    ticks: Arc<AtomicU64>,
}

impl FeedPump {
    pub fn spawn(
        server: Arc<StandardLiveDataServer>,
        feed: Arc<SimulatedFeedProvider>,
        interval: Duration,
    ) -> Self {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        log::info!("Starting feed pump, ticking every {:?}", interval);

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                for (raw_id, fields) in feed.tick() {
                    server.live_data_received(&raw_id, &fields);
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        Self { task, ticks }
    }

    /// Updates pushed so far
    pub fn ticks_sent(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for FeedPump {
    fn drop(&mut self) {
        self.task.abort();
    }
}
