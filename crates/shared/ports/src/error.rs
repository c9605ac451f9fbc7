use thiserror::Error;

/// Failure of a resolver to answer a batch at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Resolver unavailable: {0}")]
    Unavailable(String),

    #[error("Resolution failed: {0}")]
    Failed(String),
}

/// Failure of an entitlement checker to answer a batch at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("Entitlement service unavailable: {0}")]
    Unavailable(String),

    #[error("Entitlement check failed: {0}")]
    Failed(String),
}

pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;
pub type EntitlementResult<T> = std::result::Result<T, EntitlementError>;
