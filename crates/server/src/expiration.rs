//! Expiration manager
//!
//! Periodically sweeps expired distributors and renews the ones clients
//! heartbeat. Holds only a weak reference to its server so the sweep task
//! ends once the server is dropped.

use livedata_core::LiveDataSpecification;
use parking_lot::Mutex;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ExpirationConfig;
use crate::error::Result;
use crate::server::StandardLiveDataServer;

/// What one heartbeat did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeartbeatOutcome {
    /// Existing distributors whose expiry was pushed forward
    pub extended: usize,
    /// Specifications with no distributor, sent for resubscription
    pub resubscribed: usize,
}

pub struct ExpirationManager {
    server: Weak<StandardLiveDataServer>,
    check_period: Duration,
    timeout_extension: chrono::Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ExpirationManager {
    pub(crate) fn new(server: Weak<StandardLiveDataServer>, config: &ExpirationConfig) -> Self {
        Self {
            server,
            check_period: config.check_period(),
            timeout_extension: config.timeout_extension(),
            task: Mutex::new(None),
        }
    }

    pub fn check_period(&self) -> Duration {
        self.check_period
    }

    pub fn timeout_extension(&self) -> chrono::Duration {
        self.timeout_extension
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Spawn the sweep task; no-op if already running. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let server = self.server.clone();
        let period = self.check_period;
        log::info!("Starting expiration manager, checking every {:?}", period);
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(server) = server.upgrade() else {
                    break;
                };
                match server.expire_subscriptions().await {
                    Ok(0) => {}
                    Ok(expired) => log::info!("Expired {} distributors", expired),
                    Err(e) => log::warn!("Expiry sweep failed: {}", e),
                }
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            log::info!("Stopped expiration manager");
        }
    }

    /// Run one sweep now
    pub async fn expire_now(&self) -> Result<usize> {
        match self.server.upgrade() {
            Some(server) => server.expire_subscriptions().await,
            None => Ok(0),
        }
    }

    /// Heartbeat: push expiry forward for every specification that has a
    /// distributor, and resubscribe the rest in one best-effort batch.
    pub async fn extend_publication_timeout(
        &self,
        specs: &[LiveDataSpecification],
    ) -> HeartbeatOutcome {
        let Some(server) = self.server.upgrade() else {
            return HeartbeatOutcome::default();
        };

        let now = server.clock().now();
        let mut outcome = HeartbeatOutcome::default();
        let mut missing = Vec::new();
        for spec in specs {
            match server.get_market_data_distributor(spec).await {
                Some(distributor) => {
                    distributor.extend_expiry(now, self.timeout_extension);
                    outcome.extended += 1;
                }
                None => {
                    log::info!("Heartbeat for {} with no distributor, resubscribing", spec);
                    missing.push(spec.clone());
                }
            }
        }

        if !missing.is_empty() {
            outcome.resubscribed = missing.len();
            match server.subscribe(&missing, false).await {
                Ok(responses) => {
                    for response in responses.iter().filter(|r| !r.is_success()) {
                        log::warn!(
                            "Resubscription of {} failed: {}",
                            response.requested_specification,
                            response.user_message.as_deref().unwrap_or("")
                        );
                    }
                }
                Err(e) => log::warn!("Resubscription of heartbeated specifications failed: {}", e),
            }
        }
        outcome
    }
}

impl Drop for ExpirationManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
