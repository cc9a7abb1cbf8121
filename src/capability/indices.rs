//! Process capability indices (Cp, Cpk).
//!
//! Capability indices quantify how a process distribution sits within a pair
//! of limits. Here sigma is always the overall sample standard deviation of
//! the cleaned group; there is no rational subgrouping in throughput logs.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8.
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.

use serde::{Deserialize, Serialize};
use u_numflow::stats;

/// Specification window for capability analysis.
///
/// # Examples
///
/// ```
/// use u_throughput::capability::ProcessCapability;
///
/// let spec = ProcessCapability::new(Some(11.0), Some(9.0)).unwrap();
/// let data = [9.5, 10.0, 10.2, 9.8, 10.1, 10.3, 9.9, 10.0];
/// let indices = spec.compute(&data).unwrap();
/// assert!(indices.cp.is_some());
/// assert!(indices.cpk.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCapability {
    usl: Option<f64>,
    lsl: Option<f64>,
}

/// Computed capability indices.
///
/// Fields are `Option<f64>` because Cp needs both limits and Cpu/Cpl need
/// their respective limit.
///
/// | Index | Value | Interpretation |
/// |-------|-------|----------------|
/// | Cp | >= 1.33 | Spread fits the window |
/// | Cpk | >= 1.33 | Spread fits and the process is centered |
///
/// Reference: Montgomery (2019), Chapter 8, Table 8.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapabilityIndices {
    /// Cp = (USL - LSL) / (6 * sigma). Requires both limits.
    pub cp: Option<f64>,
    /// Cpk = min(Cpu, Cpl). Requires at least one limit.
    pub cpk: Option<f64>,
    /// Cpu = (USL - mean) / (3 * sigma). Requires USL.
    pub cpu: Option<f64>,
    /// Cpl = (mean - LSL) / (3 * sigma). Requires LSL.
    pub cpl: Option<f64>,
    /// Sample mean of the data.
    pub mean: f64,
    /// Sample standard deviation of the data.
    pub std_dev: f64,
}

impl ProcessCapability {
    /// Creates a specification window.
    ///
    /// # Errors
    ///
    /// Returns an error string if:
    /// - Both `usl` and `lsl` are `None`
    /// - `usl <= lsl` when both are provided
    /// - Either limit is non-finite (NaN or infinity)
    ///
    /// # Examples
    ///
    /// ```
    /// use u_throughput::capability::ProcessCapability;
    ///
    /// assert!(ProcessCapability::new(Some(10.0), None).is_ok());
    /// assert!(ProcessCapability::new(None, None).is_err());
    /// assert!(ProcessCapability::new(Some(5.0), Some(10.0)).is_err());
    /// ```
    pub fn new(usl: Option<f64>, lsl: Option<f64>) -> Result<Self, &'static str> {
        if usl.is_none() && lsl.is_none() {
            return Err("at least one specification limit (USL or LSL) is required");
        }
        if let Some(u) = usl {
            if !u.is_finite() {
                return Err("USL must be finite");
            }
        }
        if let Some(l) = lsl {
            if !l.is_finite() {
                return Err("LSL must be finite");
            }
        }
        if let (Some(u), Some(l)) = (usl, lsl) {
            if u <= l {
                return Err("USL must be greater than LSL");
            }
        }
        Ok(Self { usl, lsl })
    }

    pub fn usl(&self) -> Option<f64> {
        self.usl
    }

    pub fn lsl(&self) -> Option<f64> {
        self.lsl
    }

    /// Computes the indices from the sample mean and standard deviation of
    /// `data`.
    ///
    /// # Returns
    ///
    /// `None` if:
    /// - `data` has fewer than 2 elements
    /// - `data` contains NaN or infinity values
    /// - the standard deviation is zero
    pub fn compute(&self, data: &[f64]) -> Option<CapabilityIndices> {
        let mean = stats::mean(data)?;
        let sigma = stats::std_dev(data)?;
        self.compute_with(mean, sigma)
    }

    /// Computes the indices from a known mean and sigma.
    ///
    /// `None` when `sigma` is not finite and positive.
    pub fn compute_with(&self, mean: f64, sigma: f64) -> Option<CapabilityIndices> {
        if !sigma.is_finite() || !(sigma > 1e-300) || !mean.is_finite() {
            return None;
        }

        let cpu = self.usl.map(|u| (u - mean) / (3.0 * sigma));
        let cpl = self.lsl.map(|l| (mean - l) / (3.0 * sigma));
        let cp = match (self.usl, self.lsl) {
            (Some(u), Some(l)) => Some((u - l) / (6.0 * sigma)),
            _ => None,
        };
        let cpk = match (cpu, cpl) {
            (Some(u), Some(l)) => Some(u.min(l)),
            (Some(u), None) => Some(u),
            (None, Some(l)) => Some(l),
            (None, None) => None,
        };

        Some(CapabilityIndices {
            cp,
            cpk,
            cpu,
            cpl,
            mean,
            std_dev: sigma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Construction tests
    // -----------------------------------------------------------------------

    #[test]
    fn new_requires_at_least_one_limit() {
        assert!(ProcessCapability::new(None, None).is_err());
    }

    #[test]
    fn new_rejects_usl_leq_lsl() {
        assert!(ProcessCapability::new(Some(5.0), Some(10.0)).is_err());
        assert!(ProcessCapability::new(Some(5.0), Some(5.0)).is_err());
    }

    #[test]
    fn new_rejects_non_finite() {
        assert!(ProcessCapability::new(Some(f64::NAN), Some(1.0)).is_err());
        assert!(ProcessCapability::new(Some(10.0), Some(f64::INFINITY)).is_err());
    }

    // -----------------------------------------------------------------------
    // Computation
    // -----------------------------------------------------------------------

    /// Off-center process: mean 215, sigma 2, window [200, 220].
    ///
    /// Cp = 20 / 12 = 1.6667, Cpu = 5 / 6 = 0.8333, Cpl = 15 / 6 = 2.5
    #[test]
    fn off_center_process() {
        let spec = ProcessCapability::new(Some(220.0), Some(200.0)).unwrap();
        let indices = spec.compute_with(215.0, 2.0).unwrap();

        let cp = indices.cp.unwrap();
        assert!((cp - 1.6667).abs() < 0.001, "expected Cp ~ 1.6667, got {cp}");

        let cpu = indices.cpu.unwrap();
        assert!((cpu - 0.8333).abs() < 0.001, "expected Cpu ~ 0.8333, got {cpu}");

        let cpl = indices.cpl.unwrap();
        assert!((cpl - 2.5).abs() < 1e-12, "expected Cpl 2.5, got {cpl}");

        assert!(
            (indices.cpk.unwrap() - cpu).abs() < 1e-15,
            "Cpk should equal min(Cpu, Cpl)"
        );
    }

    #[test]
    fn usl_only_computes_cpu_not_cpl() {
        let spec = ProcessCapability::new(Some(10.0), None).unwrap();
        let data = [7.0, 8.0, 9.0, 7.5, 8.5, 8.0, 7.0, 9.0, 8.0, 8.5];
        let indices = spec.compute(&data).unwrap();

        assert!(indices.cpu.is_some());
        assert!(indices.cpl.is_none());
        assert!(indices.cp.is_none(), "Cp requires both limits");
        assert_eq!(indices.cpk, indices.cpu);
    }

    #[test]
    fn lsl_only_computes_cpl_not_cpu() {
        let spec = ProcessCapability::new(None, Some(5.0)).unwrap();
        let data = [7.0, 8.0, 9.0, 7.5, 8.5, 8.0, 7.0, 9.0, 8.0, 8.5];
        let indices = spec.compute(&data).unwrap();

        assert!(indices.cpl.is_some());
        assert!(indices.cpu.is_none());
        assert_eq!(indices.cpk, indices.cpl);
    }

    /// USL = 10, LSL = 0: Cp = 10 / (6 * s).
    #[test]
    fn exact_numerical_verification() {
        let spec = ProcessCapability::new(Some(10.0), Some(0.0)).unwrap();

        let data = [4.0, 4.5, 5.0, 5.5, 6.0, 4.0, 5.0, 6.0, 5.0, 5.0];
        let x_bar = stats::mean(&data).unwrap();
        let s = stats::std_dev(&data).unwrap();

        let indices = spec.compute(&data).unwrap();

        let expected_cp = 10.0 / (6.0 * s);
        let expected_cpu = (10.0 - x_bar) / (3.0 * s);
        let expected_cpl = x_bar / (3.0 * s);

        assert!((indices.cp.unwrap() - expected_cp).abs() < 1e-10);
        assert!((indices.cpu.unwrap() - expected_cpu).abs() < 1e-10);
        assert!((indices.cpl.unwrap() - expected_cpl).abs() < 1e-10);
        assert!((indices.cpk.unwrap() - expected_cpu.min(expected_cpl)).abs() < 1e-10);
    }

    // -----------------------------------------------------------------------
    // Edge cases
    // -----------------------------------------------------------------------

    #[test]
    fn compute_returns_none_for_insufficient_data() {
        let spec = ProcessCapability::new(Some(10.0), Some(0.0)).unwrap();
        assert!(spec.compute(&[5.0]).is_none());
        assert!(spec.compute(&[]).is_none());
    }

    #[test]
    fn compute_returns_none_for_zero_spread() {
        let spec = ProcessCapability::new(Some(10.0), Some(0.0)).unwrap();
        assert!(spec.compute(&[5.0; 8]).is_none());
    }

    #[test]
    fn compute_with_rejects_invalid_sigma() {
        let spec = ProcessCapability::new(Some(10.0), Some(0.0)).unwrap();
        assert!(spec.compute_with(5.0, 0.0).is_none());
        assert!(spec.compute_with(5.0, -1.0).is_none());
        assert!(spec.compute_with(5.0, f64::NAN).is_none());
        assert!(spec.compute_with(5.0, f64::INFINITY).is_none());
        assert!(spec.compute_with(f64::NAN, 1.0).is_none());
    }
}
