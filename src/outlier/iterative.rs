//! Z-score/IQR convergence loop.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fences::{IqrFence, ZScoreFence};
use crate::config::OutlierConfig;

/// How a filter run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Termination {
    /// Group below the minimum size; nothing was removed.
    InsufficientData { count: usize },
    /// No Z-score outliers remained after the Z pass of `round`.
    ZScore { round: u32 },
    /// Neither test found outliers after the IQR pass of `round`.
    Iqr { round: u32 },
    /// The round bound was reached; the last IQR subset is returned.
    Unconverged { rounds: u32 },
}

impl Termination {
    /// `true` unless the round bound was hit.
    pub fn converged(&self) -> bool {
        !matches!(self, Self::Unconverged { .. })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData { .. } => write!(f, "insufficient data"),
            Self::ZScore { round } => write!(f, "Z-score, round {round}"),
            Self::Iqr { round } => write!(f, "IQR, round {round}"),
            Self::Unconverged { rounds } => write!(f, "unconverged after {rounds} rounds"),
        }
    }
}

/// Result of [`OutlierFilter::filter`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Indices into the input slice of the retained values, ascending.
    pub retained: Vec<usize>,
    pub termination: Termination,
}

impl FilterOutcome {
    /// Retained values in input order.
    pub fn retained_values(&self, values: &[f64]) -> Vec<f64> {
        self.retained.iter().map(|&i| values[i]).collect()
    }

    /// Number of values removed from an input of length `input_len`.
    pub fn removed(&self, input_len: usize) -> usize {
        input_len.saturating_sub(self.retained.len())
    }
}

/// Iterative combined Z-score/IQR outlier filter.
///
/// # Algorithm
///
/// Groups smaller than `min_observations` are returned untouched. Otherwise,
/// for round `k = 1..=max_rounds`:
///
/// 1. Drop every value with `|z| > t` against the current subset's mean and
///    sample standard deviation (skipped when the deviation is zero).
/// 2. If the result has no `|z| > t` values under its own statistics, stop
///    with [`Termination::ZScore`].
/// 3. Drop every value outside the Tukey fences of the Z-filtered subset.
/// 4. If the result has no outliers by either test, stop with
///    [`Termination::Iqr`]; otherwise it becomes the current subset.
///
/// Reaching the bound yields [`Termination::Unconverged`] with the last IQR
/// subset. Every test is value-based, so input order never changes which
/// values survive.
///
/// # Examples
///
/// ```
/// use u_throughput::config::OutlierConfig;
/// use u_throughput::outlier::{OutlierFilter, Termination};
///
/// let mut data = vec![100.0; 19];
/// data.push(10_000.0);
///
/// let outcome = OutlierFilter::new(OutlierConfig::default()).filter(&data);
/// assert_eq!(outcome.retained.len(), 19);
/// assert_eq!(outcome.termination, Termination::ZScore { round: 1 });
/// assert_eq!(outcome.termination.to_string(), "Z-score, round 1");
/// ```
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    config: OutlierConfig,
}

impl OutlierFilter {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    /// Runs the convergence loop over `values`, which must be finite.
    pub fn filter(&self, values: &[f64]) -> FilterOutcome {
        let all: Vec<usize> = (0..values.len()).collect();
        if values.len() < self.config.min_observations {
            return FilterOutcome {
                retained: all,
                termination: Termination::InsufficientData {
                    count: values.len(),
                },
            };
        }

        let mut current = all;
        for round in 1..=self.config.max_rounds {
            let z_kept = self.zscore_pass(values, &current);
            if !self.has_zscore_outliers(values, &z_kept) {
                return FilterOutcome {
                    retained: z_kept,
                    termination: Termination::ZScore { round },
                };
            }

            let iqr_kept = self.iqr_pass(values, &z_kept);
            if !self.has_zscore_outliers(values, &iqr_kept)
                && !self.has_iqr_outliers(values, &iqr_kept)
            {
                return FilterOutcome {
                    retained: iqr_kept,
                    termination: Termination::Iqr { round },
                };
            }
            current = iqr_kept;
        }

        FilterOutcome {
            retained: current,
            termination: Termination::Unconverged {
                rounds: self.config.max_rounds,
            },
        }
    }

    fn gather(values: &[f64], subset: &[usize]) -> Vec<f64> {
        subset.iter().map(|&i| values[i]).collect()
    }

    fn zscore_fence(&self, values: &[f64], subset: &[usize]) -> Option<ZScoreFence> {
        ZScoreFence::fit(&Self::gather(values, subset), self.config.z_threshold)
    }

    fn iqr_fence(&self, values: &[f64], subset: &[usize]) -> Option<IqrFence> {
        IqrFence::fit(&Self::gather(values, subset), self.config.iqr_multiplier)
    }

    fn zscore_pass(&self, values: &[f64], subset: &[usize]) -> Vec<usize> {
        match self.zscore_fence(values, subset) {
            Some(fence) => subset
                .iter()
                .copied()
                .filter(|&i| !fence.is_outlier(values[i]))
                .collect(),
            None => subset.to_vec(),
        }
    }

    fn iqr_pass(&self, values: &[f64], subset: &[usize]) -> Vec<usize> {
        match self.iqr_fence(values, subset) {
            Some(fence) => subset
                .iter()
                .copied()
                .filter(|&i| !fence.is_outlier(values[i]))
                .collect(),
            None => subset.to_vec(),
        }
    }

    fn has_zscore_outliers(&self, values: &[f64], subset: &[usize]) -> bool {
        self.zscore_fence(values, subset)
            .is_some_and(|fence| subset.iter().any(|&i| fence.is_outlier(values[i])))
    }

    fn has_iqr_outliers(&self, values: &[f64], subset: &[usize]) -> bool {
        self.iqr_fence(values, subset)
            .is_some_and(|fence| subset.iter().any(|&i| fence.is_outlier(values[i])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> OutlierFilter {
        OutlierFilter::new(OutlierConfig::default())
    }

    // -----------------------------------------------------------------------
    // Insufficient data
    // -----------------------------------------------------------------------

    #[test]
    fn small_group_is_untouched() {
        let data = [1.0, 2.0, 3.0, 1000.0, 2.0, 1.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0, 2.0];
        let outcome = filter().filter(&data);
        assert_eq!(outcome.retained, (0..14).collect::<Vec<_>>());
        assert_eq!(outcome.termination, Termination::InsufficientData { count: 14 });
        assert_eq!(outcome.termination.to_string(), "insufficient data");
        assert_eq!(outcome.removed(data.len()), 0);
    }

    #[test]
    fn removed_never_underflows() {
        let outcome = FilterOutcome {
            retained: vec![0, 1, 2],
            termination: Termination::ZScore { round: 1 },
        };
        assert_eq!(outcome.removed(5), 2);
        assert_eq!(outcome.removed(1), 0);
    }

    #[test]
    fn empty_input() {
        let outcome = filter().filter(&[]);
        assert!(outcome.retained.is_empty());
        assert_eq!(outcome.termination, Termination::InsufficientData { count: 0 });
    }

    // -----------------------------------------------------------------------
    // Convergence
    // -----------------------------------------------------------------------

    #[test]
    fn single_spike_removed_by_zscore() {
        let mut data = vec![100.0; 19];
        data.insert(7, 10_000.0);
        let outcome = filter().filter(&data);
        assert_eq!(outcome.retained.len(), 19);
        assert!(!outcome.retained.contains(&7));
        assert_eq!(outcome.termination, Termination::ZScore { round: 1 });
    }

    #[test]
    fn constant_group_never_divides_by_zero() {
        let data = [250.0; 30];
        let outcome = filter().filter(&data);
        assert_eq!(outcome.retained.len(), 30);
        assert_eq!(outcome.termination, Termination::ZScore { round: 1 });
    }

    #[test]
    fn clean_spread_converges_in_round_one() {
        let data: Vec<f64> = (0..40).map(|i| 500.0 + (i % 10) as f64).collect();
        let outcome = filter().filter(&data);
        assert_eq!(outcome.retained.len(), 40);
        assert_eq!(outcome.termination, Termination::ZScore { round: 1 });
    }

    #[test]
    fn zscore_stop_keeps_values_within_threshold() {
        // Two moderate spikes inflate the deviation so neither exceeds
        // |z| = 3; the loop stops after the first Z pass.
        let mut data: Vec<f64> = (0..18).map(|i| 100.0 + (i % 6) as f64).collect();
        data.extend([160.0, 160.0]);
        let outcome = filter().filter(&data);
        assert_eq!(outcome.retained.len(), 20);
        assert_eq!(outcome.termination, Termination::ZScore { round: 1 });
    }

    #[test]
    fn iqr_stage_removes_unmasked_outlier() {
        // The Z pass removes 10000, which exposes 160 as a new Z outlier;
        // the IQR pass then removes it.
        let mut data: Vec<f64> = (0..18).map(|i| 100.0 + (i % 6) as f64).collect();
        data.extend([160.0, 10_000.0]);
        let outcome = filter().filter(&data);
        let kept = outcome.retained_values(&data);
        assert_eq!(kept.len(), 18, "kept = {kept:?}");
        assert!(kept.iter().all(|&v| v < 110.0));
        assert_eq!(outcome.termination, Termination::Iqr { round: 1 });
    }

    #[test]
    fn heavy_tail_needs_second_round() {
        let mut data: Vec<f64> = (0..15).map(|i| 10.0 + (i % 3) as f64).collect();
        data.extend([20.0, 40.0, 80.0, 160.0, 320.0, 640.0, 1e4, 1e5]);
        let outcome = filter().filter(&data);
        assert_eq!(outcome.retained.len(), 15);
        assert_eq!(outcome.termination, Termination::Iqr { round: 2 });
    }

    #[test]
    fn bound_reached_reports_unconverged() {
        let config = OutlierConfig {
            max_rounds: 1,
            ..Default::default()
        };
        let mut data: Vec<f64> = (0..15).map(|i| 10.0 + (i % 3) as f64).collect();
        data.extend([20.0, 40.0, 80.0, 160.0, 320.0, 640.0, 1e4, 1e5]);
        let outcome = OutlierFilter::new(config).filter(&data);
        assert!(!outcome.termination.converged());
        assert_eq!(outcome.termination.to_string(), "unconverged after 1 rounds");
        let kept = outcome.retained_values(&data);
        assert_eq!(kept.len(), 17);
        assert!(kept.contains(&40.0));
    }

    // -----------------------------------------------------------------------
    // Value-based inclusion
    // -----------------------------------------------------------------------

    #[test]
    fn identical_values_share_fate() {
        let mut data = vec![50.0; 20];
        data.extend([900.0, 900.0]);
        data.extend([51.0, 49.0, 50.5]);
        let outcome = filter().filter(&data);
        let kept = outcome.retained_values(&data);
        assert!(kept.iter().all(|&v| v != 900.0));
        assert_eq!(kept.iter().filter(|&&v| v == 50.0).count(), 20);
    }

    #[test]
    fn retained_indices_ascending() {
        let mut data: Vec<f64> = (0..30).map(|i| (i % 7) as f64).collect();
        data[3] = 1e6;
        let outcome = filter().filter(&data);
        assert!(outcome.retained.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn termination_labels() {
        assert_eq!(Termination::Iqr { round: 4 }.to_string(), "IQR, round 4");
        assert_eq!(Termination::ZScore { round: 2 }.to_string(), "Z-score, round 2");
        assert!(Termination::Iqr { round: 4 }.converged());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn filter() -> OutlierFilter {
        OutlierFilter::new(OutlierConfig::default())
    }

    proptest! {
        #[test]
        fn never_grows(
            data in proptest::collection::vec(0.0_f64..1e4, 0..=80)
        ) {
            let outcome = filter().filter(&data);
            prop_assert!(outcome.retained.len() <= data.len());
            prop_assert!(outcome.retained.iter().all(|&i| i < data.len()));
        }

        #[test]
        fn small_groups_are_identity(
            data in proptest::collection::vec(0.0_f64..1e4, 0..15)
        ) {
            let outcome = filter().filter(&data);
            prop_assert_eq!(outcome.retained_values(&data), data.clone());
            prop_assert_eq!(
                outcome.termination,
                Termination::InsufficientData { count: data.len() }
            );
        }

        #[test]
        fn converged_output_is_stable(
            data in proptest::collection::vec(0.0_f64..1e4, 15..=80)
        ) {
            let outcome = filter().filter(&data);
            let kept = outcome.retained_values(&data);
            if outcome.termination.converged() && kept.len() >= 15 {
                let again = filter().filter(&kept);
                prop_assert_eq!(again.termination, Termination::ZScore { round: 1 });
                prop_assert_eq!(again.retained.len(), kept.len());
            }
        }

        #[test]
        fn order_does_not_matter(
            data in proptest::collection::vec(0.0_f64..1e4, 15..=60)
        ) {
            let mut reversed = data.clone();
            reversed.reverse();

            let mut a = filter().filter(&data).retained_values(&data);
            let mut b = filter().filter(&reversed).retained_values(&reversed);
            a.sort_by(f64::total_cmp);
            b.sort_by(f64::total_cmp);
            prop_assert_eq!(a, b);
        }
    }
}
