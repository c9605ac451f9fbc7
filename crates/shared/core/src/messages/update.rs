use crate::fields::FieldContainer;
use crate::identifiers::LiveDataSpecification;
use serde::{Deserialize, Serialize};

/// Field set by which a provider snapshot signals a permission denial; the
/// field value carries the reason
pub const LIVE_DATA_PERMISSION_DENIED_FIELD: &str = "livedata.permission.denied";

/// A normalized value published for one fully-qualified specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveDataValueUpdate {
    /// Per-distributor sequence number; 0 for snapshots built outside a
    /// live distribution
    pub sequence_number: u64,
    pub specification: LiveDataSpecification,
    pub fields: FieldContainer,
}

impl LiveDataValueUpdate {
    pub fn new(
        sequence_number: u64,
        specification: LiveDataSpecification,
        fields: FieldContainer,
    ) -> Self {
        Self {
            sequence_number,
            specification,
            fields,
        }
    }
}
