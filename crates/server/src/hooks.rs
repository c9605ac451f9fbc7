//! Admission and post-commit hooks around `subscribe`

use livedata_core::RawId;

pub trait SubscriptionHooks: Send + Sync {
    /// Veto a batch of new raw subscriptions before anything is sent
    /// upstream. An `Err` fails the whole subscribe call.
    fn check_subscribe(&self, _raw_ids: &[RawId]) -> Result<(), String> {
        Ok(())
    }

    /// Called after the registry lock is released with the raw ids that
    /// were established
    fn subscription_done(&self, _raw_ids: &[RawId]) {}
}

/// Accepts everything, does nothing afterwards
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSubscriptionHooks;

impl SubscriptionHooks for NoOpSubscriptionHooks {}
