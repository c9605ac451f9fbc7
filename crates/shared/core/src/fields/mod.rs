//! Field messages carried by market data updates

mod container;
mod history;

pub use container::{FieldContainer, FieldValue};
pub use history::FieldHistoryStore;
