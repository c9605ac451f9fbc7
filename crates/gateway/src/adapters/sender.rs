//! Channel-backed market data sender
//!
//! All distributors share one broadcast channel; each tick is tagged with
//! the subject derived from its distribution target so clients can filter.

use crate::error::TransportError;
use crate::messages::TickMessage;
use crate::transport::Subjects;
use crate::transport::channel::{ChannelPublisher, ChannelSubscriber};
use livedata_core::{DistributionSpecification, LiveDataValueUpdate};
use livedata_ports::{MarketDataSender, MarketDataSenderFactory};

/// Creates one [`ChannelMarketDataSender`] per distributor
#[derive(Clone)]
pub struct ChannelSenderFactory {
    publisher: ChannelPublisher<TickMessage>,
}

impl ChannelSenderFactory {
    pub fn new(capacity: usize) -> (Self, ChannelSubscriber<TickMessage>) {
        let (publisher, subscriber) = ChannelPublisher::pair(Subjects::TICK_PREFIX, capacity);
        (Self { publisher }, subscriber)
    }

    /// Attach another tick consumer
    pub fn subscribe(&self) -> ChannelSubscriber<TickMessage> {
        self.publisher.subscribe()
    }
}

impl MarketDataSenderFactory for ChannelSenderFactory {
    fn create(&self, spec: &DistributionSpecification) -> Vec<Box<dyn MarketDataSender>> {
        vec![Box::new(ChannelMarketDataSender {
            subject: Subjects::ticks(spec.tick_distribution_target()),
            publisher: self.publisher.clone(),
        })]
    }
}

/// Publishes every update of one distributor on its tick subject
pub struct ChannelMarketDataSender {
    subject: String,
    publisher: ChannelPublisher<TickMessage>,
}

impl ChannelMarketDataSender {
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl MarketDataSender for ChannelMarketDataSender {
    fn send(&self, update: &LiveDataValueUpdate) {
        let tick = TickMessage::new(self.subject.clone(), update.clone());
        match self.publisher.publish_now(tick) {
            Ok(_) => {}
            Err(TransportError::NoSubscribers(_)) => {
                log::trace!("No tick consumers for {}", self.subject);
            }
            Err(e) => log::warn!("Failed to publish tick on {}: {}", self.subject, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Subscriber;
    use livedata_core::{ExternalId, FieldContainer, LiveDataSpecification, StandardRules};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn distribution_spec() -> DistributionSpecification {
        let fq = LiveDataSpecification::of("No Normalization", ExternalId::of("SIM", "FOO"));
        DistributionSpecification::new(
            fq,
            Arc::new(StandardRules::no_normalization()),
            "LiveData.SIM~FOO",
        )
    }

    #[tokio::test]
    async fn test_sender_publishes_tagged_tick() {
        let (factory, mut ticks) = ChannelSenderFactory::new(16);
        let spec = distribution_spec();
        let senders = factory.create(&spec);
        assert_eq!(senders.len(), 1);

        let update = LiveDataValueUpdate::new(
            3,
            spec.fully_qualified_specification().clone(),
            FieldContainer::new().with("LAST", dec!(101.5)),
        );
        senders[0].send(&update);

        let tick = ticks.next().await.unwrap();
        assert_eq!(tick.subject, "LiveData.SIM~FOO");
        assert_eq!(tick.update, update);
    }

    #[test]
    fn test_send_without_consumers_is_silent() {
        let (factory, ticks) = ChannelSenderFactory::new(4);
        drop(ticks);
        let spec = distribution_spec();
        let update = LiveDataValueUpdate::new(
            0,
            spec.fully_qualified_specification().clone(),
            FieldContainer::new(),
        );
        for sender in factory.create(&spec) {
            sender.send(&update);
        }
    }
}
