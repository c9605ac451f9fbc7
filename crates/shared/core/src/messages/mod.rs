//! Request, response and update messages exchanged with clients

mod request;
mod response;
mod update;

pub use request::{SubscriptionRequest, SubscriptionType, UserPrincipal};
pub use response::{SubscriptionResponse, SubscriptionResponseMsg, SubscriptionResult};
pub use update::{LIVE_DATA_PERMISSION_DENIED_FIELD, LiveDataValueUpdate};
