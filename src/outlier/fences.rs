//! Single-pass outlier fences.
//!
//! # Z-score fence
//!
//! ```text
//! z_i = (x_i - x̄) / s        (s = sample standard deviation)
//! outlier  <=>  |z_i| > t     (t = 3 by default)
//! ```
//!
//! # IQR fence (Tukey, 1977)
//!
//! ```text
//! lower = Q1 - k * IQR,  upper = Q3 + k * IQR,  IQR = Q3 - Q1   (k = 1.5)
//! outlier  <=>  x < lower  or  x > upper
//! ```
//!
//! Quartiles use linear interpolation between order statistics (Hyndman &
//! Fan type 7), the convention of most spreadsheet and dataframe tools.
//!
//! Both fences are purely value-based: two equal values are always on the
//! same side of a fence.
//!
//! # References
//!
//! - Tukey, J.W. (1977). *Exploratory Data Analysis*. Addison-Wesley.
//! - Hyndman, R.J. & Fan, Y. (1996). "Sample Quantiles in Statistical
//!   Packages", *The American Statistician* 50(4), pp. 361-365.

use u_numflow::stats;

/// Z-score fence around a sample mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreFence {
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

impl ZScoreFence {
    /// Builds the fence for `values`.
    ///
    /// Returns `None` when the spread is undefined or zero (fewer than two
    /// values, or all values identical): there is nothing to filter.
    pub fn fit(values: &[f64], threshold: f64) -> Option<Self> {
        let mean = stats::mean(values)?;
        let std_dev = stats::std_dev(values)?;
        if !(std_dev > 1e-300) {
            return None;
        }
        Some(Self {
            mean,
            std_dev,
            threshold,
        })
    }

    /// Absolute Z-score of `x`.
    pub fn z(&self, x: f64) -> f64 {
        ((x - self.mean) / self.std_dev).abs()
    }

    pub fn is_outlier(&self, x: f64) -> bool {
        self.z(x) > self.threshold
    }
}

/// Tukey IQR fence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFence {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFence {
    /// Builds the fence for `values`. `None` for an empty slice.
    pub fn fit(values: &[f64], multiplier: f64) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = stats::quantile(&sorted, 0.25)?;
        let q3 = stats::quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    pub fn is_outlier(&self, x: f64) -> bool {
        x < self.lower || x > self.upper
    }
}
