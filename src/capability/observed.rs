//! Descriptive statistics and self-referenced capability of a cleaned group.
//!
//! Throughput has no engineering specification window, so the limits are
//! derived from the group itself:
//!
//! ```text
//! USL = x̄ + 3s,  LSL = x̄ - 3s
//! Cp  = (USL - LSL) / 6s
//! Cpk = min((x̄ - LSL) / 3s, (USL - x̄) / 3s)
//! ```
//!
//! With the limits frozen from the same mean, both indices equal 1.0 up to
//! rounding whenever `s > 0`. They measure self-consistency of the cleaned
//! distribution, not conformance; when `s == 0` both are undefined (`None`).

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use super::ProcessCapability;

/// Location and spread of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Descriptive {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` for a single value.
    pub std_dev: Option<f64>,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
}

impl Descriptive {
    /// `None` for empty input or when the mean is not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_throughput::capability::Descriptive;
    ///
    /// let d = Descriptive::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
    /// assert_eq!(d.count, 4);
    /// assert!((d.mean - 2.5).abs() < 1e-12);
    /// assert_eq!(d.min, 1.0);
    /// assert_eq!(d.max, 4.0);
    /// ```
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = stats::mean(values)?;
        if !mean.is_finite() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count: values.len(),
            mean,
            std_dev: stats::std_dev(values).filter(|s| s.is_finite()),
            median: stats::median(&sorted)?,
            min: *sorted.first()?,
            max: *sorted.last()?,
            q1: stats::quantile(&sorted, 0.25)?,
            q3: stats::quantile(&sorted, 0.75)?,
        })
    }
}

/// Descriptive statistics plus Cp/Cpk against mean ± 3s pseudo-limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedCapability {
    pub descriptive: Descriptive,
    /// Pseudo-USL; `None` when the spread is undefined or zero.
    pub usl: Option<f64>,
    /// Pseudo-LSL; `None` when the spread is undefined or zero.
    pub lsl: Option<f64>,
    pub cp: Option<f64>,
    pub cpk: Option<f64>,
}

impl ObservedCapability {
    /// Analyzes a cleaned group.
    ///
    /// Returns `None` only when [`Descriptive::from_values`] does.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_throughput::capability::ObservedCapability;
    ///
    /// let cap = ObservedCapability::from_values(&[98.0, 100.0, 102.0, 101.0, 99.0]).unwrap();
    /// assert!((cap.cp.unwrap() - 1.0).abs() < 1e-9);
    /// assert!((cap.cpk.unwrap() - 1.0).abs() < 1e-9);
    ///
    /// let flat = ObservedCapability::from_values(&[100.0; 5]).unwrap();
    /// assert!(flat.cp.is_none());
    /// assert!(flat.cpk.is_none());
    /// ```
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let descriptive = Descriptive::from_values(values)?;
        let indices = descriptive.std_dev.and_then(|s| {
            let usl = descriptive.mean + 3.0 * s;
            let lsl = descriptive.mean - 3.0 * s;
            let spec = ProcessCapability::new(Some(usl), Some(lsl)).ok()?;
            spec.compute_with(descriptive.mean, s)
                .map(|indices| (spec, indices))
        });

        Some(match indices {
            Some((spec, indices)) => Self {
                descriptive,
                usl: spec.usl(),
                lsl: spec.lsl(),
                cp: indices.cp,
                cpk: indices.cpk,
            },
            None => Self {
                descriptive,
                usl: None,
                lsl: None,
                cp: None,
                cpk: None,
            },
        })
    }
}
