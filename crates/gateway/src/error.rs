//! Error types for the gateway crate

use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Channel closed")]
    ChannelClosed,

    #[error("No subscriber is listening on {0}")]
    NoSubscribers(String),

    #[error("Responder dropped the request without replying")]
    NoReply,

    #[error("Timeout waiting for response")]
    Timeout,
}
