//! Grouping keys and partitioning.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::Measurement;

/// Identity of one statistical population.
///
/// Ordering is lexicographic on product id, then model id, then secondary
/// dimension (`None` before any value). Every report is emitted in this
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub product_id: String,
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl GroupKey {
    /// Builds the key for `m`; the secondary dimension is part of the key
    /// only when `use_secondary` is set.
    pub fn for_measurement(m: &Measurement, use_secondary: bool) -> Self {
        Self {
            product_id: m.product_id.clone(),
            model_id: m.model_id.clone(),
            secondary: if use_secondary {
                m.secondary.clone()
            } else {
                None
            },
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product_id, self.model_id)?;
        if let Some(secondary) = &self.secondary {
            write!(f, "/{secondary}")?;
        }
        Ok(())
    }
}

/// Splits measurements into groups in key order. Within a group, input
/// order is preserved.
pub fn partition(
    measurements: Vec<Measurement>,
    use_secondary: bool,
) -> BTreeMap<GroupKey, Vec<Measurement>> {
    let mut groups: BTreeMap<GroupKey, Vec<Measurement>> = BTreeMap::new();
    for m in measurements {
        groups
            .entry(GroupKey::for_measurement(&m, use_secondary))
            .or_default()
            .push(m);
    }
    groups
}
