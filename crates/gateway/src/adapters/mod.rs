//! Adapters from server ports onto the transport layer

mod sender;

pub use sender::{ChannelMarketDataSender, ChannelSenderFactory};
