//! Auxiliary lookup table of per-product normalization constants.
//!
//! The caller owns the table; the engine only reads it. Each entry carries
//! the two wire-count components of the wire-bonding line and, optionally,
//! a package body size for the pick-and-place line. The wire divisor is
//!
//! ```text
//! divisor = primary_factor / 2 + secondary_factor
//! ```
//!
//! (bumps count as half a wire). Any divisor that is missing, non-finite or
//! not positive falls back to `1.0` and is marked unadjusted, so downstream
//! consumers can tell "no normalization available" from a true divisor of 1.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::grouping::clean_product_id;
use crate::table::RawTable;

/// Raw normalization components for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationComponents {
    /// Bump count (halved in the divisor).
    pub primary_factor: f64,
    /// Wires required per unit.
    pub secondary_factor: f64,
    /// Package body size, used by row-level normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<f64>,
}

/// A divisor that is always safe to divide by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConstant {
    /// Always finite and strictly positive.
    pub divisor: f64,
    /// `false` when `divisor` is the 1.0 fallback.
    pub adjusted: bool,
}

impl NormalizationConstant {
    /// The 1.0 fallback, marked unadjusted.
    pub const UNADJUSTED: Self = Self {
        divisor: 1.0,
        adjusted: false,
    };

    /// Wraps a candidate divisor, falling back when it is unusable.
    ///
    /// ```
    /// use u_throughput::lookup::NormalizationConstant;
    ///
    /// assert_eq!(NormalizationConstant::from_divisor(4.0).divisor, 4.0);
    /// assert!(!NormalizationConstant::from_divisor(0.0).adjusted);
    /// assert!(!NormalizationConstant::from_divisor(f64::NAN).adjusted);
    /// ```
    pub fn from_divisor(divisor: f64) -> Self {
        if divisor.is_finite() && divisor > 0.0 {
            Self {
                divisor,
                adjusted: true,
            }
        } else {
            Self::UNADJUSTED
        }
    }

    /// `primary / 2 + secondary`, with the usual fallback.
    ///
    /// ```
    /// use u_throughput::lookup::NormalizationConstant;
    ///
    /// let c = NormalizationConstant::from_components(10.0, 2.0);
    /// assert_eq!(c.divisor, 7.0);
    /// assert!(c.adjusted);
    /// ```
    pub fn from_components(primary_factor: f64, secondary_factor: f64) -> Self {
        Self::from_divisor(primary_factor / 2.0 + secondary_factor)
    }
}

/// Header names of a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSchema {
    pub product_id: String,
    pub primary_factor: String,
    pub secondary_factor: String,
    /// Optional column.
    pub body_size: String,
}

impl Default for LookupSchema {
    fn default() -> Self {
        Self {
            product_id: "product_id".to_string(),
            primary_factor: "primary_factor".to_string(),
            secondary_factor: "secondary_factor".to_string(),
            body_size: "body_size".to_string(),
        }
    }
}

/// Read-only map from product identifier to normalization components.
///
/// # Examples
///
/// ```
/// use u_throughput::lookup::{AuxiliaryLookup, NormalizationComponents};
///
/// let mut lookup = AuxiliaryLookup::new();
/// lookup.insert(
///     "bom-1",
///     NormalizationComponents {
///         primary_factor: 10.0,
///         secondary_factor: 2.0,
///         body_size: None,
///     },
/// );
///
/// assert_eq!(lookup.wire_divisor("BOM-1").divisor, 7.0);
/// assert!(!lookup.wire_divisor("BOM-2").adjusted);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryLookup {
    entries: BTreeMap<String, NormalizationComponents>,
}

impl AuxiliaryLookup {
    /// Creates an empty lookup; every query falls back to 1.0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `key`. The key is cleaned like a
    /// product id so that lookups match ingested measurements.
    pub fn insert(&mut self, key: &str, components: NormalizationComponents) {
        self.entries.insert(clean_product_id(key), components);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the lookup has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw components for `key`.
    pub fn get(&self, key: &str) -> Option<&NormalizationComponents> {
        self.entries.get(&clean_product_id(key))
    }

    /// Group-level wire divisor for a product.
    pub fn wire_divisor(&self, key: &str) -> NormalizationConstant {
        self.get(key)
            .map(|c| NormalizationConstant::from_components(c.primary_factor, c.secondary_factor))
            .unwrap_or(NormalizationConstant::UNADJUSTED)
    }

    /// Row-level body-size divisor.
    pub fn body_size(&self, key: &str) -> NormalizationConstant {
        self.get(key)
            .and_then(|c| c.body_size)
            .map(NormalizationConstant::from_divisor)
            .unwrap_or(NormalizationConstant::UNADJUSTED)
    }

    /// Builds a lookup from a table.
    ///
    /// Unparsable component cells read as 0, which makes the resulting
    /// divisor fall back to 1.0; an unparsable body size reads as absent.
    /// Rows with an empty key are skipped, and a repeated key keeps its
    /// first row.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingColumns`] when a required header is absent.
    pub fn from_table(table: &RawTable, schema: &LookupSchema) -> Result<Self> {
        let required = [
            &schema.product_id,
            &schema.primary_factor,
            &schema.secondary_factor,
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        let (Some(key_col), Some(primary_col), Some(secondary_col)) = (
            table.column_index(&schema.product_id),
            table.column_index(&schema.primary_factor),
            table.column_index(&schema.secondary_factor),
        ) else {
            return Err(EngineError::MissingColumns {
                table: "lookup",
                columns: missing,
            });
        };
        let body_col = table.column_index(&schema.body_size);

        let number = |cell: &str| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite());

        let mut lookup = Self::new();
        for row in 0..table.len() {
            let key = clean_product_id(table.cell(row, key_col));
            if key.is_empty() || lookup.entries.contains_key(&key) {
                continue;
            }
            let components = NormalizationComponents {
                primary_factor: number(table.cell(row, primary_col)).unwrap_or(0.0),
                secondary_factor: number(table.cell(row, secondary_col)).unwrap_or(0.0),
                body_size: body_col.and_then(|c| number(table.cell(row, c))),
            };
            lookup.entries.insert(key, components);
        }
        Ok(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(primary: f64, secondary: f64) -> NormalizationComponents {
        NormalizationComponents {
            primary_factor: primary,
            secondary_factor: secondary,
            body_size: None,
        }
    }

    #[test]
    fn divisor_formula() {
        let c = NormalizationConstant::from_components(10.0, 2.0);
        assert!((c.divisor - 7.0).abs() < 1e-15);
        assert!(c.adjusted);

        let c = NormalizationConstant::from_components(3.0, 0.0);
        assert!((c.divisor - 1.5).abs() < 1e-15);
    }

    #[test]
    fn non_positive_divisor_falls_back() {
        assert_eq!(
            NormalizationConstant::from_components(0.0, 0.0),
            NormalizationConstant::UNADJUSTED
        );
        assert_eq!(
            NormalizationConstant::from_components(-4.0, 1.0),
            NormalizationConstant::UNADJUSTED
        );
        assert_eq!(
            NormalizationConstant::from_divisor(f64::INFINITY),
            NormalizationConstant::UNADJUSTED
        );
    }

    #[test]
    fn keys_are_cleaned_on_insert_and_query() {
        let mut lookup = AuxiliaryLookup::new();
        lookup.insert(" 1200.0 ", components(4.0, 1.0));
        assert_eq!(lookup.wire_divisor("1200").divisor, 3.0);
        assert_eq!(lookup.wire_divisor("1200.0\n").divisor, 3.0);
        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn body_size_lookup() {
        let mut lookup = AuxiliaryLookup::new();
        lookup.insert(
            "QFN",
            NormalizationComponents {
                body_size: Some(2.5),
                ..Default::default()
            },
        );
        lookup.insert("SOP", components(2.0, 2.0));
        assert_eq!(lookup.body_size("qfn").divisor, 2.5);
        assert!(!lookup.body_size("SOP").adjusted);
        assert!(!lookup.body_size("BGA").adjusted);
    }

    #[test]
    fn from_table_parses_and_defaults() {
        let mut table = RawTable::new(["product_id", "primary_factor", "secondary_factor", "body_size"]);
        table.push_row(["a", "10", "2", "3.0"]);
        table.push_row(["b", "x", "", ""]);
        table.push_row(["a", "100", "100", ""]);
        table.push_row(["", "1", "1", ""]);
        let lookup = AuxiliaryLookup::from_table(&table, &LookupSchema::default()).unwrap();

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.wire_divisor("A").divisor, 7.0);
        assert_eq!(lookup.body_size("A").divisor, 3.0);
        assert!(!lookup.wire_divisor("B").adjusted);
        assert_eq!(lookup.get("B").unwrap().body_size, None);
    }

    #[test]
    fn from_table_reports_missing_columns() {
        let table = RawTable::new(["product_id", "body_size"]);
        let err = AuxiliaryLookup::from_table(&table, &LookupSchema::default()).unwrap_err();
        match err {
            EngineError::MissingColumns { table, columns } => {
                assert_eq!(table, "lookup");
                assert_eq!(columns, vec!["primary_factor", "secondary_factor"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn body_size_column_is_optional() {
        let mut table = RawTable::new(["product_id", "primary_factor", "secondary_factor"]);
        table.push_row(["a", "2", "1"]);
        let lookup = AuxiliaryLookup::from_table(&table, &LookupSchema::default()).unwrap();
        assert_eq!(lookup.wire_divisor("A").divisor, 2.0);
    }
}
