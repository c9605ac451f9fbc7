use livedata_core::{DistributionSpecification, LiveDataValueUpdate};

/// Port publishing normalized updates for one distribution
///
/// Called on the tick dispatch path with distributor state locked, so
/// implementations must not block.
pub trait MarketDataSender: Send + Sync {
    fn send(&self, update: &LiveDataValueUpdate);
}

/// Creates the senders for a newly created distributor
pub trait MarketDataSenderFactory: Send + Sync {
    fn create(&self, spec: &DistributionSpecification) -> Vec<Box<dyn MarketDataSender>>;
}

/// Factory producing no senders; updates are only kept as last values
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyMarketDataSenderFactory;

impl MarketDataSenderFactory for EmptyMarketDataSenderFactory {
    fn create(&self, _spec: &DistributionSpecification) -> Vec<Box<dyn MarketDataSender>> {
        Vec::new()
    }
}
