//! Logical-to-physical column mapping and header validation.

use serde::{Deserialize, Serialize};

use super::RawTable;
use crate::error::{EngineError, Result};

/// Header names for each logical input field.
///
/// Defaults are the logical names themselves. Process lines whose exports
/// use other headers override individual fields:
///
/// ```
/// use u_throughput::table::ColumnSchema;
///
/// let schema = ColumnSchema {
///     product_id: "bom_no".into(),
///     model_id: "machine model".into(),
///     throughput: "uph".into(),
///     ..Default::default()
/// };
/// assert_eq!(schema.secondary_dimension, "secondary_dimension");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    /// Product identifier (BOM number, device).
    pub product_id: String,
    /// Machine or model identifier.
    pub model_id: String,
    /// Raw UPH.
    pub throughput: String,
    /// Package code or operation code; required only when grouping uses it.
    pub secondary_dimension: String,
    /// Observation timestamp; always optional.
    pub timestamp: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            product_id: "product_id".to_string(),
            model_id: "model_id".to_string(),
            throughput: "throughput".to_string(),
            secondary_dimension: "secondary_dimension".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

/// Column positions of a validated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub product_id: usize,
    pub model_id: usize,
    pub throughput: usize,
    pub secondary_dimension: Option<usize>,
    pub timestamp: Option<usize>,
}

impl ColumnSchema {
    /// Resolves every field against the table header.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingColumns`] listing all absent required headers.
    /// The secondary dimension is required only when `require_secondary`.
    pub fn resolve(&self, table: &RawTable, require_secondary: bool) -> Result<ResolvedColumns> {
        let mut missing = Vec::new();
        let mut required = |name: &str| {
            let idx = table.column_index(name);
            if idx.is_none() {
                missing.push(name.to_string());
            }
            idx
        };

        let product_id = required(&self.product_id);
        let model_id = required(&self.model_id);
        let throughput = required(&self.throughput);
        let secondary_dimension = if require_secondary {
            required(&self.secondary_dimension)
        } else {
            table.column_index(&self.secondary_dimension)
        };

        match (product_id, model_id, throughput) {
            (Some(product_id), Some(model_id), Some(throughput)) if missing.is_empty() => {
                Ok(ResolvedColumns {
                    product_id,
                    model_id,
                    throughput,
                    secondary_dimension,
                    timestamp: table.column_index(&self.timestamp),
                })
            }
            _ => Err(EngineError::MissingColumns {
                table: "measurement",
                columns: missing,
            }),
        }
    }
}
