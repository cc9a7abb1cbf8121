//! Aggregate reporting.
//!
//! Turns cleaned, normalized groups into the output record set: one
//! [`GroupSummary`] per group in grouping-key order, the groups that could
//! not be summarized, roll-ups by secondary dimension and a run overview.
//! Ordering is fully determined by the keys, so identical input yields
//! identical output regardless of row order.

mod rollup;
mod summary;

pub use rollup::{secondary_rollups, RankedGroup, ReportOverview, SecondaryRollup};
pub use summary::{round_to, GroupFailure, GroupSummary};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::DropCounts;

/// Everything one analysis run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// One row per summarized group, in key order.
    pub summaries: Vec<GroupSummary>,
    /// Groups that failed, in key order.
    pub failures: Vec<GroupFailure>,
    /// Per secondary-dimension aggregates.
    pub rollups: Vec<SecondaryRollup>,
    /// `None` when no group was summarized.
    pub overview: Option<ReportOverview>,
    /// Rows dropped before grouping.
    pub dropped: DropCounts,
}

impl SummaryReport {
    /// Serializes the report to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a report from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Summary row for a product/model pair, ignoring the secondary
    /// dimension.
    pub fn find(&self, product_id: &str, model_id: &str) -> Option<&GroupSummary> {
        self.summaries
            .iter()
            .find(|s| s.product_id == product_id && s.model_id == model_id)
    }
}
