//! Live data server errors

use livedata_gateway::TransportError;
use livedata_ports::{EntitlementError, ResolutionError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection to market data API down")]
    NotConnected,

    #[error("Already connected to market data API")]
    AlreadyConnected,

    #[error("Cannot disconnect: not connected to market data API")]
    NotConnectedForDisconnect,

    #[error("Upstream provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Contract violation: {0}")]
    Contract(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an [`UpstreamProvider`](crate::UpstreamProvider)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Market data API unavailable: {0}")]
    Unavailable(String),

    #[error("Market data API rejected the request: {0}")]
    Rejected(String),

    #[error("Market data API call failed: {0}")]
    Failed(String),
}

/// Failure raised by a subscription listener callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Listener failed: {0}")]
pub struct ListenerError(pub String);
