//! Throughput normalization.
//!
//! Raw UPH is not comparable across products: a unit with forty wires takes
//! longer to bond than one with four. Normalization divides throughput by a
//! per-product constant from the [`AuxiliaryLookup`] in one of two places:
//!
//! - **Group level** (wire bonding): average the cleaned raw values, then
//!   divide the mean by the product's wire divisor.
//! - **Row level** (pick-and-place): divide every row by its package body
//!   size first, then average the adjusted rows.
//!
//! In both modes the 1.0 fallback is reported through
//! [`NormalizationStatus`] instead of passing silently as a real divisor.

use serde::{Deserialize, Serialize};

use crate::lookup::{AuxiliaryLookup, NormalizationConstant};
use crate::table::Measurement;

/// Which key row-level normalization looks the body size up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKey {
    ProductId,
    SecondaryDimension,
}

/// Where the divisor is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// One wire divisor per product, applied to the group mean.
    #[default]
    GroupLevel,
    /// One body-size divisor per row, applied before averaging.
    RowLevel { key: LookupKey },
}

/// Whether a reported adjusted value reflects a real divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStatus {
    /// Every value was divided by a constant from the lookup.
    Applied,
    /// Row level only: some rows had a constant, others fell back to 1.0.
    Partial,
    /// No constant was available; the adjusted value equals the raw one.
    Unadjusted,
}

impl NormalizationStatus {
    fn from_counts(adjusted: usize, total: usize) -> Self {
        match adjusted {
            0 => Self::Unadjusted,
            n if n == total => Self::Applied,
            _ => Self::Partial,
        }
    }
}

/// A single row divided by its own constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowAdjustment {
    /// `raw / constant.divisor`.
    pub value: f64,
    pub constant: NormalizationConstant,
}

/// Group-level normalization outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupNormalization {
    /// Mean of the adjusted values (or adjusted mean of the raw values).
    pub adjusted_mean: f64,
    /// The divisor shared by the whole group, if there is exactly one.
    pub divisor: Option<f64>,
    pub status: NormalizationStatus,
}

/// Divides one raw value by `constant`.
pub fn normalize_row(raw: f64, constant: NormalizationConstant) -> RowAdjustment {
    RowAdjustment {
        value: raw / constant.divisor,
        constant,
    }
}

/// Divides a group mean by `constant`.
///
/// # Examples
///
/// ```
/// use u_throughput::lookup::NormalizationConstant;
/// use u_throughput::normalize::{normalize_group_mean, NormalizationStatus};
///
/// let result = normalize_group_mean(70.0, NormalizationConstant::from_components(10.0, 2.0));
/// assert!((result.adjusted_mean - 10.0).abs() < 1e-12);
/// assert_eq!(result.status, NormalizationStatus::Applied);
/// ```
pub fn normalize_group_mean(raw_mean: f64, constant: NormalizationConstant) -> GroupNormalization {
    GroupNormalization {
        adjusted_mean: raw_mean / constant.divisor,
        divisor: Some(constant.divisor),
        status: if constant.adjusted {
            NormalizationStatus::Applied
        } else {
            NormalizationStatus::Unadjusted
        },
    }
}

/// Averages row adjustments. `None` for an empty slice.
pub fn normalize_row_mean(rows: &[RowAdjustment]) -> Option<GroupNormalization> {
    let first = rows.first()?;
    let n = rows.len() as f64;
    let adjusted_mean = rows.iter().map(|r| r.value).sum::<f64>() / n;
    let adjusted = rows.iter().filter(|r| r.constant.adjusted).count();
    let shared = rows
        .iter()
        .all(|r| r.constant.divisor == first.constant.divisor)
        .then_some(first.constant.divisor);
    Some(GroupNormalization {
        adjusted_mean,
        divisor: shared,
        status: NormalizationStatus::from_counts(adjusted, rows.len()),
    })
}

/// Applies a [`NormalizationMode`] against a lookup table.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    mode: NormalizationMode,
    lookup: &'a AuxiliaryLookup,
}

impl<'a> Normalizer<'a> {
    pub fn new(mode: NormalizationMode, lookup: &'a AuxiliaryLookup) -> Self {
        Self { mode, lookup }
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    /// Per-row adjustments, or `None` in group-level mode.
    ///
    /// In row-level mode a row whose lookup key is absent (for example a
    /// missing package code) is divided by the 1.0 fallback.
    pub fn adjust_rows(&self, measurements: &[Measurement]) -> Option<Vec<RowAdjustment>> {
        let NormalizationMode::RowLevel { key } = self.mode else {
            return None;
        };
        Some(
            measurements
                .iter()
                .map(|m| {
                    let lookup_key = match key {
                        LookupKey::ProductId => Some(m.product_id.as_str()),
                        LookupKey::SecondaryDimension => m.secondary.as_deref(),
                    };
                    let constant = lookup_key
                        .map(|k| self.lookup.body_size(k))
                        .unwrap_or(NormalizationConstant::UNADJUSTED);
                    normalize_row(m.throughput, constant)
                })
                .collect(),
        )
    }

    /// Normalizes a cleaned group.
    ///
    /// Group-level mode divides `raw_mean` by the product's wire divisor;
    /// row-level mode averages `rows`. Returns `None` only when row-level
    /// mode is given no rows.
    pub fn normalize_group(
        &self,
        product_id: &str,
        raw_mean: f64,
        rows: Option<&[RowAdjustment]>,
    ) -> Option<GroupNormalization> {
        match self.mode {
            NormalizationMode::GroupLevel => Some(normalize_group_mean(
                raw_mean,
                self.lookup.wire_divisor(product_id),
            )),
            NormalizationMode::RowLevel { .. } => normalize_row_mean(rows?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::NormalizationComponents;

    fn measurement(product: &str, secondary: Option<&str>, uph: f64) -> Measurement {
        Measurement {
            row: 0,
            product_id: product.into(),
            model_id: "M".into(),
            throughput: uph,
            secondary: secondary.map(Into::into),
            timestamp: None,
        }
    }

    fn lookup() -> AuxiliaryLookup {
        let mut lookup = AuxiliaryLookup::new();
        lookup.insert(
            "P1",
            NormalizationComponents {
                primary_factor: 10.0,
                secondary_factor: 2.0,
                body_size: Some(4.0),
            },
        );
        lookup.insert(
            "QFN",
            NormalizationComponents {
                body_size: Some(2.0),
                ..Default::default()
            },
        );
        lookup
    }

    // -----------------------------------------------------------------------
    // Group level
    // -----------------------------------------------------------------------

    #[test]
    fn group_level_divides_mean() {
        let lookup = lookup();
        let n = Normalizer::new(NormalizationMode::GroupLevel, &lookup);
        let result = n.normalize_group("P1", 70.0, None).unwrap();
        assert!((result.adjusted_mean - 10.0).abs() < 1e-12);
        assert_eq!(result.divisor, Some(7.0));
        assert_eq!(result.status, NormalizationStatus::Applied);
    }

    #[test]
    fn missing_product_is_marked_unadjusted() {
        let lookup = lookup();
        let n = Normalizer::new(NormalizationMode::GroupLevel, &lookup);
        let result = n.normalize_group("UNKNOWN", 123.4, None).unwrap();
        assert_eq!(result.adjusted_mean, 123.4);
        assert_eq!(result.divisor, Some(1.0));
        assert_eq!(result.status, NormalizationStatus::Unadjusted);
    }

    #[test]
    fn group_level_has_no_row_adjustments() {
        let lookup = lookup();
        let n = Normalizer::new(NormalizationMode::GroupLevel, &lookup);
        assert!(n.adjust_rows(&[measurement("P1", None, 10.0)]).is_none());
    }

    // -----------------------------------------------------------------------
    // Row level
    // -----------------------------------------------------------------------

    #[test]
    fn row_level_by_secondary_dimension() {
        let lookup = lookup();
        let n = Normalizer::new(
            NormalizationMode::RowLevel {
                key: LookupKey::SecondaryDimension,
            },
            &lookup,
        );
        let rows = n
            .adjust_rows(&[
                measurement("P1", Some("QFN"), 10.0),
                measurement("P1", Some("QFN"), 30.0),
            ])
            .unwrap();
        assert_eq!(rows[0].value, 5.0);
        assert_eq!(rows[1].value, 15.0);

        let result = n.normalize_group("P1", 20.0, Some(&rows)).unwrap();
        assert!((result.adjusted_mean - 10.0).abs() < 1e-12);
        assert_eq!(result.divisor, Some(2.0));
        assert_eq!(result.status, NormalizationStatus::Applied);
    }

    #[test]
    fn row_level_by_product() {
        let lookup = lookup();
        let n = Normalizer::new(
            NormalizationMode::RowLevel {
                key: LookupKey::ProductId,
            },
            &lookup,
        );
        let rows = n.adjust_rows(&[measurement("P1", None, 8.0)]).unwrap();
        assert_eq!(rows[0].value, 2.0);
        assert_eq!(rows[0].constant.divisor, 4.0);
    }

    #[test]
    fn mixed_rows_are_partial() {
        let lookup = lookup();
        let n = Normalizer::new(
            NormalizationMode::RowLevel {
                key: LookupKey::SecondaryDimension,
            },
            &lookup,
        );
        let rows = n
            .adjust_rows(&[
                measurement("P1", Some("QFN"), 10.0),
                measurement("P1", None, 10.0),
            ])
            .unwrap();
        assert!(!rows[1].constant.adjusted);
        assert_eq!(rows[1].value, 10.0);

        let result = normalize_row_mean(&rows).unwrap();
        assert_eq!(result.status, NormalizationStatus::Partial);
        assert_eq!(result.divisor, None);
        assert!((result.adjusted_mean - 7.5).abs() < 1e-12);
    }

    #[test]
    fn all_fallback_rows_are_unadjusted() {
        let rows = [normalize_row(5.0, NormalizationConstant::UNADJUSTED)];
        let result = normalize_row_mean(&rows).unwrap();
        assert_eq!(result.status, NormalizationStatus::Unadjusted);
        assert_eq!(result.divisor, Some(1.0));
    }

    #[test]
    fn empty_rows_yield_none() {
        assert!(normalize_row_mean(&[]).is_none());
        let lookup = lookup();
        let n = Normalizer::new(
            NormalizationMode::RowLevel {
                key: LookupKey::ProductId,
            },
            &lookup,
        );
        assert!(n.normalize_group("P1", 1.0, None).is_none());
    }
}
