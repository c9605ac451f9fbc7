//! Simulated upstream feed
//!
//! A seeded random walk per ticker behind the [`UpstreamProvider`] port, so
//! a node can run end to end without a real market data vendor.
//!
//! - `do_subscribe` hands out a fresh uuid handle per known ticker; unknown
//!   tickers are left out of the answer.
//! - `do_snapshot` returns `LAST`/`BID`/`ASK` around the current price, or
//!   the permission-denied marker for denied tickers.

use async_trait::async_trait;
use livedata_core::{ExternalScheme, FieldContainer, LIVE_DATA_PERMISSION_DENIED_FIELD, RawId};
use livedata_server::{ProviderError, Subscription, SubscriptionHandle, UpstreamProvider};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::config::FeedConfig;

pub const LAST: &str = "LAST";
pub const BID: &str = "BID";
pub const ASK: &str = "ASK";

/// Per-ticker multiplicative random walk
pub struct RandomWalk {
    prices: BTreeMap<String, Decimal>,
    volatility: f64,
    rng: StdRng,
}

impl RandomWalk {
    pub fn new(prices: BTreeMap<String, Decimal>, volatility: Decimal, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            prices,
            volatility: volatility.to_f64().unwrap_or(0.0),
            rng,
        }
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.prices.contains_key(ticker)
    }

    pub fn price(&self, ticker: &str) -> Option<Decimal> {
        self.prices.get(ticker).copied()
    }

    /// Move `ticker` one step: price * (1 + volatility * U(-1, 1))
    pub fn step(&mut self, ticker: &str) -> Option<Decimal> {
        let change: f64 = self.rng.gen_range(-1.0..=1.0);
        let multiplier = Decimal::from_f64(1.0 + self.volatility * change).unwrap_or(Decimal::ONE);

        let price = self.prices.get_mut(ticker)?;
        let next = (*price * multiplier).round_dp(6);
        // a walk never crosses zero
        if next > Decimal::ZERO {
            *price = next;
        }
        Some(*price)
    }
}

pub struct SimulatedFeedProvider {
    scheme: ExternalScheme,
    half_spread: Decimal,
    denied: HashSet<String>,
    walk: Mutex<RandomWalk>,
    subscribed: Mutex<BTreeMap<RawId, SubscriptionHandle>>,
    connected: AtomicBool,
}

impl SimulatedFeedProvider {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            scheme: ExternalScheme::new(config.scheme.clone()),
            half_spread: config.spread / dec!(2),
            denied: config.denied.iter().cloned().collect(),
            walk: Mutex::new(RandomWalk::new(
                config.tickers.clone(),
                config.volatility,
                config.seed,
            )),
            subscribed: Mutex::new(BTreeMap::new()),
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Tickers with a live upstream handle
    pub fn subscribed_tickers(&self) -> Vec<RawId> {
        self.subscribed.lock().keys().cloned().collect()
    }

    pub fn price(&self, ticker: &str) -> Option<Decimal> {
        self.walk.lock().price(ticker)
    }

    /// Advance every subscribed ticker and return the resulting updates
    pub fn tick(&self) -> Vec<(RawId, FieldContainer)> {
        if !self.is_connected() {
            return Vec::new();
        }
        let tickers = self.subscribed_tickers();
        let mut walk = self.walk.lock();
        tickers
            .into_iter()
            .filter_map(|ticker| {
                let price = walk.step(&ticker)?;
                Some((ticker, self.image(price)))
            })
            .collect()
    }

    fn image(&self, last: Decimal) -> FieldContainer {
        let offset = (last * self.half_spread).round_dp(6);
        FieldContainer::new()
            .with(LAST, last)
            .with(BID, last - offset)
            .with(ASK, last + offset)
    }

    fn verify_connected(&self) -> Result<(), ProviderError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable("simulated feed is not connected".into()))
        }
    }
}

#[async_trait]
impl UpstreamProvider for SimulatedFeedProvider {
    fn unique_id_domain(&self) -> ExternalScheme {
        self.scheme.clone()
    }

    async fn do_connect(&self) -> Result<(), ProviderError> {
        self.connected.store(true, Ordering::SeqCst);
        log::info!("Simulated feed connected");
        Ok(())
    }

    async fn do_disconnect(&self) -> Result<(), ProviderError> {
        self.connected.store(false, Ordering::SeqCst);
        self.subscribed.lock().clear();
        log::info!("Simulated feed disconnected");
        Ok(())
    }

    async fn do_subscribe(
        &self,
        raw_ids: &[RawId],
    ) -> Result<HashMap<RawId, SubscriptionHandle>, ProviderError> {
        self.verify_connected()?;
        let walk = self.walk.lock();
        let mut subscribed = self.subscribed.lock();

        let mut handles = HashMap::with_capacity(raw_ids.len());
        for raw_id in raw_ids {
            if !walk.contains(raw_id) {
                log::warn!("Simulated feed has no ticker {}", raw_id);
                continue;
            }
            let handle = SubscriptionHandle::new(Uuid::new_v4().to_string());
            subscribed.insert(raw_id.clone(), handle.clone());
            handles.insert(raw_id.clone(), handle);
        }
        Ok(handles)
    }

    async fn do_unsubscribe(&self, handles: &[SubscriptionHandle]) -> Result<(), ProviderError> {
        self.verify_connected()?;
        self.subscribed
            .lock()
            .retain(|_, handle| !handles.contains(handle));
        Ok(())
    }

    async fn do_snapshot(
        &self,
        raw_ids: &[RawId],
    ) -> Result<HashMap<RawId, FieldContainer>, ProviderError> {
        self.verify_connected()?;
        let walk = self.walk.lock();
        Ok(raw_ids
            .iter()
            .filter_map(|raw_id| {
                let fields = if self.denied.contains(raw_id) {
                    FieldContainer::new().with(
                        LIVE_DATA_PERMISSION_DENIED_FIELD,
                        format!("Not entitled to {}", raw_id),
                    )
                } else {
                    self.image(walk.price(raw_id)?)
                };
                Some((raw_id.clone(), fields))
            })
            .collect())
    }

    /// Seed every new subscription with the current image
    fn snapshot_on_subscription_start_required(&self, _subscription: &Subscription) -> bool {
        true
    }
}
