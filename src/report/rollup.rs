//! Cross-group aggregates built from summary rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use super::summary::{round_to, GroupSummary};
use crate::grouping::GroupKey;

/// Adjusted-mean statistics of all groups sharing a secondary dimension
/// value, e.g. every product/model combination run on one package code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryRollup {
    pub secondary_dimension: String,
    pub group_count: usize,
    pub mean_adjusted: f64,
    /// Sample standard deviation across groups; `None` for one group.
    pub std_adjusted: Option<f64>,
}

/// Rolls summaries up by secondary dimension, in lexicographic order.
/// Summaries without a secondary dimension are skipped.
pub fn secondary_rollups(summaries: &[GroupSummary], decimals: u32) -> Vec<SecondaryRollup> {
    let mut buckets: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for s in summaries {
        if let Some(secondary) = s.secondary_dimension.as_deref() {
            buckets.entry(secondary).or_default().push(s.adjusted_mean);
        }
    }

    buckets
        .into_iter()
        .filter_map(|(secondary, values)| {
            Some(SecondaryRollup {
                secondary_dimension: secondary.to_string(),
                group_count: values.len(),
                mean_adjusted: round_to(stats::mean(&values)?, decimals),
                std_adjusted: stats::std_dev(&values).map(|s| round_to(s, decimals)),
            })
        })
        .collect()
}

/// One extreme of the adjusted-mean ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub key: GroupKey,
    pub adjusted_mean: f64,
}

/// Run-level headline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    pub average_adjusted_mean: f64,
    /// Highest adjusted mean; the first in key order on ties.
    pub best: RankedGroup,
    /// Lowest adjusted mean; the first in key order on ties.
    pub worst: RankedGroup,
    pub product_count: usize,
    pub model_count: usize,
}

impl ReportOverview {
    /// `None` when there are no summaries. `summaries` must be in key order
    /// for the tie rule to hold.
    pub fn from_summaries(summaries: &[GroupSummary], decimals: u32) -> Option<Self> {
        let first = summaries.first()?;
        let mut best = first;
        let mut worst = first;
        for s in &summaries[1..] {
            if s.adjusted_mean > best.adjusted_mean {
                best = s;
            }
            if s.adjusted_mean < worst.adjusted_mean {
                worst = s;
            }
        }

        let adjusted: Vec<f64> = summaries.iter().map(|s| s.adjusted_mean).collect();
        let products: BTreeSet<&str> = summaries.iter().map(|s| s.product_id.as_str()).collect();
        let models: BTreeSet<&str> = summaries.iter().map(|s| s.model_id.as_str()).collect();

        Some(Self {
            average_adjusted_mean: round_to(stats::mean(&adjusted)?, decimals),
            best: RankedGroup {
                key: best.key(),
                adjusted_mean: best.adjusted_mean,
            },
            worst: RankedGroup {
                key: worst.key(),
                adjusted_mean: worst.adjusted_mean,
            },
            product_count: products.len(),
            model_count: models.len(),
        })
    }
}
