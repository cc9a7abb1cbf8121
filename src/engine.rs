//! The throughput engine: the two entry points external collaborators call.
//!
//! ```text
//! RawTable ──ingest──▶ Measurements ──partition──▶ groups (key order)
//!     ──[row-level divisor]──▶ OutlierFilter ──▶ CleanedBatch
//!
//! CleanedBatch ──▶ ObservedCapability + Normalizer ──▶ GroupSummary ──▶ SummaryReport
//! ```
//!
//! Groups never share state, and every per-group failure is captured as a
//! [`GroupFailure`] so one bad group cannot stop the others. Only a schema
//! error aborts a run, and it does so before any group is processed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capability::{Descriptive, ObservedCapability};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::grouping::{partition, GroupKey, ModelCanonicalizer};
use crate::lookup::AuxiliaryLookup;
use crate::normalize::{NormalizationStatus, Normalizer, RowAdjustment};
use crate::outlier::{OutlierFilter, Termination};
use crate::report::{
    secondary_rollups, GroupFailure, GroupSummary, ReportOverview, SummaryReport,
};
use crate::table::{ingest, ColumnSchema, DropCounts, Measurement, RawTable};

/// One group after outlier filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedGroup {
    pub key: GroupKey,
    /// Rows in the group before filtering.
    pub count_before: usize,
    /// Retained rows in input order.
    pub measurements: Vec<Measurement>,
    /// Per-row adjustments aligned with `measurements`; row-level mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_adjustments: Option<Vec<RowAdjustment>>,
    pub termination: Termination,
}

impl CleanedGroup {
    /// Raw throughput of the retained rows.
    pub fn values(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.throughput).collect()
    }
}

/// Output of [`ThroughputEngine::normalize_and_filter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedBatch {
    /// Groups in key order.
    pub groups: Vec<CleanedGroup>,
    pub dropped: DropCounts,
}

impl CleanedBatch {
    /// All retained rows, group by group.
    pub fn records(&self) -> impl Iterator<Item = &Measurement> {
        self.groups.iter().flat_map(|g| g.measurements.iter())
    }

    pub fn count_before(&self) -> usize {
        self.groups.iter().map(|g| g.count_before).sum()
    }

    pub fn count_after(&self) -> usize {
        self.groups.iter().map(|g| g.measurements.len()).sum()
    }
}

/// Batch analyzer for throughput tables.
///
/// # Examples
///
/// ```
/// use u_throughput::config::EngineConfig;
/// use u_throughput::engine::ThroughputEngine;
/// use u_throughput::lookup::{AuxiliaryLookup, NormalizationComponents};
/// use u_throughput::table::RawTable;
///
/// let mut table = RawTable::new(["product_id", "model_id", "throughput"]);
/// for _ in 0..19 {
///     table.push_row(["BOM-1", "WB3100-A", "700"]);
/// }
/// table.push_row(["BOM-1", "WB3100-B", "90000"]);
///
/// let mut lookup = AuxiliaryLookup::new();
/// lookup.insert(
///     "BOM-1",
///     NormalizationComponents {
///         primary_factor: 10.0,
///         secondary_factor: 2.0,
///         body_size: None,
///     },
/// );
///
/// let engine = ThroughputEngine::new(EngineConfig::wire_bonding()).unwrap();
/// let report = engine.analyze(&table, &lookup).unwrap();
///
/// let row = &report.summaries[0];
/// assert_eq!(row.model_id, "WB3100");
/// assert_eq!(row.count_before, 20);
/// assert_eq!(row.count_after, 19);
/// assert_eq!(row.raw_mean, 700.0);
/// assert_eq!(row.adjusted_mean, 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct ThroughputEngine {
    config: EngineConfig,
    schema: ColumnSchema,
    canonicalizer: ModelCanonicalizer,
    filter: OutlierFilter,
}

impl ThroughputEngine {
    /// Creates an engine with the default [`ColumnSchema`].
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidConfig`](crate::error::EngineError::InvalidConfig)
    /// when the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            canonicalizer: ModelCanonicalizer::new(&config.grouping.model_families),
            filter: OutlierFilter::new(config.outlier.clone()),
            schema: ColumnSchema::default(),
            config,
        })
    }

    /// Replaces the input column mapping.
    pub fn with_schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Validates and coerces `table`, groups it, applies row-level divisors
    /// when configured, and filters outliers per group.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingColumns`](crate::error::EngineError::MissingColumns)
    /// when a required column is absent; nothing is processed in that case.
    pub fn normalize_and_filter(
        &self,
        table: &RawTable,
        lookup: &AuxiliaryLookup,
    ) -> Result<CleanedBatch> {
        let use_secondary = self.config.grouping.use_secondary_dimension;
        let ingested = ingest(table, &self.schema, &self.canonicalizer, use_secondary)?;
        let normalizer = Normalizer::new(self.config.normalization, lookup);

        let groups: Vec<CleanedGroup> = partition(ingested.measurements, use_secondary)
            .into_iter()
            .map(|(key, measurements)| self.filter_group(key, measurements, &normalizer))
            .collect();

        info!(
            rows = table.len(),
            dropped = ingested.dropped.total(),
            groups = groups.len(),
            "filtered throughput table"
        );

        Ok(CleanedBatch {
            groups,
            dropped: ingested.dropped,
        })
    }

    fn filter_group(
        &self,
        key: GroupKey,
        measurements: Vec<Measurement>,
        normalizer: &Normalizer<'_>,
    ) -> CleanedGroup {
        let values: Vec<f64> = measurements.iter().map(|m| m.throughput).collect();
        let adjustments = normalizer.adjust_rows(&measurements);
        let outcome = self.filter.filter(&values);

        debug!(
            group = %key,
            before = values.len(),
            after = outcome.retained.len(),
            method = %outcome.termination,
            "outlier filter finished"
        );
        if !outcome.termination.converged() {
            warn!(group = %key, method = %outcome.termination, "outlier filter did not converge");
        }

        let row_adjustments =
            adjustments.map(|rows| outcome.retained.iter().map(|&i| rows[i]).collect());
        let count_before = measurements.len();
        let measurements = outcome
            .retained
            .iter()
            .map(|&i| measurements[i].clone())
            .collect();

        CleanedGroup {
            key,
            count_before,
            measurements,
            row_adjustments,
            termination: outcome.termination,
        }
    }

    /// Summarizes every cleaned group into a report.
    ///
    /// Summaries and failures are in key order. A group whose statistics or
    /// normalization are undefined becomes a [`GroupFailure`].
    pub fn summarize(&self, batch: &CleanedBatch, lookup: &AuxiliaryLookup) -> SummaryReport {
        let normalizer = Normalizer::new(self.config.normalization, lookup);
        let mut report = SummaryReport {
            dropped: batch.dropped,
            ..Default::default()
        };

        for group in &batch.groups {
            match self.summarize_group(group, &normalizer) {
                Ok(summary) => report.summaries.push(summary),
                Err(reason) => {
                    warn!(group = %group.key, %reason, "group could not be summarized");
                    report.failures.push(GroupFailure {
                        key: group.key.clone(),
                        reason,
                    });
                }
            }
        }

        let decimals = self.config.precision.ratio_decimals;
        report.rollups = secondary_rollups(&report.summaries, decimals);
        report.overview = ReportOverview::from_summaries(&report.summaries, decimals);
        report
    }

    fn summarize_group(
        &self,
        group: &CleanedGroup,
        normalizer: &Normalizer<'_>,
    ) -> std::result::Result<GroupSummary, String> {
        let capability = ObservedCapability::from_values(&group.values())
            .ok_or_else(|| "throughput statistics are undefined".to_string())?;
        let normalization = normalizer
            .normalize_group(
                &group.key.product_id,
                capability.descriptive.mean,
                group.row_adjustments.as_deref(),
            )
            .ok_or_else(|| "row-level adjustments are missing".to_string())?;
        if !normalization.adjusted_mean.is_finite() {
            return Err("adjusted mean is not finite".to_string());
        }
        if normalization.status == NormalizationStatus::Unadjusted {
            warn!(group = %group.key, "no normalization constant, reporting unadjusted");
        }

        let summary = GroupSummary::new(
            &group.key,
            group.count_before,
            group.termination,
            &capability,
            &normalization,
            &self.config.precision,
        );
        let adjusted: Option<Vec<f64>> = group
            .row_adjustments
            .as_ref()
            .map(|rows| rows.iter().map(|r| r.value).collect());
        Ok(match adjusted.as_deref().and_then(Descriptive::from_values) {
            Some(spread) => summary.with_adjusted_spread(&spread, &self.config.precision),
            None => summary,
        })
    }

    /// [`normalize_and_filter`](Self::normalize_and_filter) followed by
    /// [`summarize`](Self::summarize).
    pub fn analyze(&self, table: &RawTable, lookup: &AuxiliaryLookup) -> Result<SummaryReport> {
        let batch = self.normalize_and_filter(table, lookup)?;
        Ok(self.summarize(&batch, lookup))
    }
}
