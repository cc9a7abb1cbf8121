//! Engine configuration.
//!
//! Every constant of the pipeline lives here so that the per-process
//! differences (wire bonding, die attach, pick-and-place) are expressed as
//! data rather than as separate code paths.
//!
//! # Examples
//!
//! ```
//! use u_throughput::config::{EngineConfig, OutlierConfig};
//!
//! let config = EngineConfig {
//!     outlier: OutlierConfig {
//!         max_rounds: 10,
//!         ..Default::default()
//!     },
//!     ..EngineConfig::wire_bonding()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::normalize::{LookupKey, NormalizationMode};

/// Largest number of decimals accepted for report rounding.
const MAX_DECIMALS: u32 = 12;

/// Master configuration for a [`ThroughputEngine`](crate::engine::ThroughputEngine).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Iterative outlier filter settings.
    pub outlier: OutlierConfig,

    /// Grouping key and model-family settings.
    pub grouping: GroupingConfig,

    /// Where the per-product divisor is applied.
    pub normalization: NormalizationMode,

    /// Report rounding.
    pub precision: PrecisionConfig,
}

/// Iterative outlier filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Groups smaller than this are never filtered.
    pub min_observations: usize,
    /// Upper bound on Z-score/IQR rounds.
    pub max_rounds: u32,
    /// Absolute Z-score above which a value is an outlier.
    pub z_threshold: f64,
    /// IQR fence multiplier (Tukey's k).
    pub iqr_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            min_observations: 15,
            max_rounds: 20,
            z_threshold: 3.0,
            iqr_multiplier: 1.5,
        }
    }
}

/// Grouping key configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Known model families. A cleaned model id containing one of these is
    /// collapsed to it; the first match in list order wins.
    pub model_families: Vec<String>,
    /// Add the secondary dimension (package code, operation code) to the key.
    pub use_secondary_dimension: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            model_families: ["WB3100", "WB3200", "WB3300"]
                .into_iter()
                .map(String::from)
                .collect(),
            use_secondary_dimension: false,
        }
    }
}

/// Decimal precision of reported figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecisionConfig {
    /// Throughput figures (UPH means, std dev, quantiles, divisor).
    pub throughput_decimals: u32,
    /// Dimensionless ratios (adjusted mean, Cp, Cpk).
    pub ratio_decimals: u32,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            throughput_decimals: 2,
            ratio_decimals: 3,
        }
    }
}

impl EngineConfig {
    /// Wire bonding: one wire-count divisor per product, applied to the
    /// group mean. This is also the [`Default`].
    pub fn wire_bonding() -> Self {
        Self::default()
    }

    /// Die attach: no model families, no normalization constants expected.
    pub fn die_attach() -> Self {
        Self {
            grouping: GroupingConfig {
                model_families: Vec::new(),
                use_secondary_dimension: false,
            },
            ..Self::default()
        }
    }

    /// Pick-and-place: rows are divided by the package body size before
    /// averaging, and the package code is part of the grouping key.
    pub fn pick_and_place() -> Self {
        Self {
            grouping: GroupingConfig {
                model_families: Vec::new(),
                use_secondary_dimension: true,
            },
            normalization: NormalizationMode::RowLevel {
                key: LookupKey::SecondaryDimension,
            },
            ..Self::default()
        }
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the first offending
    /// setting.
    pub fn validate(&self) -> Result<()> {
        let outlier = &self.outlier;
        if outlier.min_observations < 2 {
            return Err(EngineError::InvalidConfig(
                "outlier.min_observations must be at least 2".into(),
            ));
        }
        if outlier.max_rounds == 0 {
            return Err(EngineError::InvalidConfig(
                "outlier.max_rounds must be at least 1".into(),
            ));
        }
        if !outlier.z_threshold.is_finite() || outlier.z_threshold <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "outlier.z_threshold must be finite and positive".into(),
            ));
        }
        if !outlier.iqr_multiplier.is_finite() || outlier.iqr_multiplier <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "outlier.iqr_multiplier must be finite and positive".into(),
            ));
        }
        if self
            .grouping
            .model_families
            .iter()
            .any(|family| family.trim().is_empty())
        {
            return Err(EngineError::InvalidConfig(
                "grouping.model_families must not contain empty entries".into(),
            ));
        }
        if self.precision.throughput_decimals > MAX_DECIMALS
            || self.precision.ratio_decimals > MAX_DECIMALS
        {
            return Err(EngineError::InvalidConfig(format!(
                "precision decimals must not exceed {MAX_DECIMALS}"
            )));
        }
        if matches!(
            self.normalization,
            NormalizationMode::RowLevel {
                key: LookupKey::SecondaryDimension
            }
        ) && !self.grouping.use_secondary_dimension
        {
            return Err(EngineError::InvalidConfig(
                "row-level normalization keyed by the secondary dimension requires \
                 grouping.use_secondary_dimension"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
