//! Per-group summary rows.

use serde::{Deserialize, Serialize};

use crate::capability::{Descriptive, ObservedCapability};
use crate::config::PrecisionConfig;
use crate::grouping::GroupKey;
use crate::normalize::{GroupNormalization, NormalizationStatus};
use crate::outlier::Termination;

/// Rounds half away from zero to `decimals` places.
///
/// ```
/// use u_throughput::report::round_to;
///
/// assert_eq!(round_to(812.345, 2), 812.35);
/// assert_eq!(round_to(-0.0005, 3), -0.001);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// One output row: the cleaned statistics of a group.
///
/// Throughput figures are rounded to
/// [`PrecisionConfig::throughput_decimals`], dimensionless ratios (adjusted
/// mean, Cp, Cpk) to [`PrecisionConfig::ratio_decimals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub product_id: String,
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_dimension: Option<String>,
    pub count_before: usize,
    pub count_after: usize,
    pub raw_mean: f64,
    /// Raw mean per divisor unit (group level) or mean of per-row adjusted
    /// values (row level).
    pub adjusted_mean: f64,
    /// Divisor shared by the whole group; `None` when rows used different
    /// divisors.
    pub divisor: Option<f64>,
    pub normalization: NormalizationStatus,
    /// Sample standard deviation; `None` for a single retained value.
    pub std_dev: Option<f64>,
    /// Median of the per-row adjusted values; row-level mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_median: Option<f64>,
    /// Sample standard deviation of the per-row adjusted values; row-level
    /// mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_std_dev: Option<f64>,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    /// `None` when the spread is zero or undefined.
    pub cp: Option<f64>,
    /// `None` when the spread is zero or undefined.
    pub cpk: Option<f64>,
    /// Human-readable filter tag, e.g. `"IQR, round 2"`.
    pub outlier_method: String,
    pub termination: Termination,
}

impl GroupSummary {
    /// Assembles and rounds a summary row.
    pub fn new(
        key: &GroupKey,
        count_before: usize,
        termination: Termination,
        capability: &ObservedCapability,
        normalization: &GroupNormalization,
        precision: &PrecisionConfig,
    ) -> Self {
        let t = |v: f64| round_to(v, precision.throughput_decimals);
        let r = |v: f64| round_to(v, precision.ratio_decimals);
        let d = &capability.descriptive;

        Self {
            product_id: key.product_id.clone(),
            model_id: key.model_id.clone(),
            secondary_dimension: key.secondary.clone(),
            count_before,
            count_after: d.count,
            raw_mean: t(d.mean),
            adjusted_mean: r(normalization.adjusted_mean),
            divisor: normalization.divisor.map(t),
            normalization: normalization.status,
            std_dev: d.std_dev.map(t),
            adjusted_median: None,
            adjusted_std_dev: None,
            median: t(d.median),
            min: t(d.min),
            max: t(d.max),
            q1: t(d.q1),
            q3: t(d.q3),
            cp: capability.cp.map(r),
            cpk: capability.cpk.map(r),
            outlier_method: termination.to_string(),
            termination,
        }
    }

    /// Adds the spread of the per-row adjusted values, rounded at ratio
    /// precision.
    pub fn with_adjusted_spread(
        mut self,
        adjusted: &Descriptive,
        precision: &PrecisionConfig,
    ) -> Self {
        let r = |v: f64| round_to(v, precision.ratio_decimals);
        self.adjusted_median = Some(r(adjusted.median));
        self.adjusted_std_dev = adjusted.std_dev.map(r);
        self
    }

    /// Key of the group this row describes.
    pub fn key(&self) -> GroupKey {
        GroupKey {
            product_id: self.product_id.clone(),
            model_id: self.model_id.clone(),
            secondary: self.secondary_dimension.clone(),
        }
    }

    /// Rows removed by the outlier filter.
    pub fn removed(&self) -> usize {
        self.count_before.saturating_sub(self.count_after)
    }
}

/// A group that could not be summarized; other groups are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub key: GroupKey,
    pub reason: String,
}
