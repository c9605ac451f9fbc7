use super::FieldContainer;

/// Last known value of every field seen on one raw feed.
///
/// Updated on every raw tick; read by normalization rules that need to fill
/// in fields a partial update did not carry.
#[derive(Debug, Clone, Default)]
pub struct FieldHistoryStore {
    last_known: FieldContainer,
}

impl FieldHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an update into the store
    pub fn live_data_received(&mut self, msg: &FieldContainer) {
        self.last_known.merge(msg);
    }

    /// Copy of all last known values
    pub fn last_known_values(&self) -> FieldContainer {
        self.last_known.clone()
    }

    pub fn last_known(&self) -> &FieldContainer {
        &self.last_known
    }

    pub fn is_empty(&self) -> bool {
        self.last_known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_history_accumulates_fields() {
        let mut history = FieldHistoryStore::new();
        assert!(history.is_empty());

        history.live_data_received(&FieldContainer::new().with("BID", dec!(99)));
        history.live_data_received(&FieldContainer::new().with("ASK", dec!(101)));
        history.live_data_received(&FieldContainer::new().with("BID", dec!(100)));

        let lkv = history.last_known_values();
        assert_eq!(lkv.get_decimal("BID"), Some(dec!(100)));
        assert_eq!(lkv.get_decimal("ASK"), Some(dec!(101)));
    }
}
