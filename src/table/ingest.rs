//! Row coercion: from string cells to typed measurements.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ColumnSchema, RawTable};
use crate::error::Result;
use crate::grouping::{clean_identifier, clean_product_id, ModelCanonicalizer};

/// One throughput observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Zero-based index of the source row in the input table.
    pub row: usize,
    /// Cleaned, upper-cased product identifier.
    pub product_id: String,
    /// Canonical model identifier (after family collapsing).
    pub model_id: String,
    /// Raw UPH, always finite and positive.
    pub throughput: f64,
    /// Cleaned secondary dimension, when the column exists and is non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    /// Timestamp cell as supplied; not interpreted by the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Rows discarded before grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    /// Throughput cell empty, non-numeric or non-finite.
    pub unparsable_throughput: usize,
    /// Throughput parsed but zero or negative.
    #[serde(default)]
    pub non_positive_throughput: usize,
    /// Product or model id empty after cleaning.
    pub missing_identifier: usize,
}

impl DropCounts {
    /// Total rows dropped.
    pub fn total(&self) -> usize {
        self.unparsable_throughput + self.non_positive_throughput + self.missing_identifier
    }
}

/// Result of [`ingest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub measurements: Vec<Measurement>,
    pub dropped: DropCounts,
}

/// Parses a throughput cell; `None` for anything that is not a finite number.
fn parse_throughput(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Validates the header and coerces every row.
///
/// # Errors
///
/// Only schema errors; coercion failures are counted in
/// [`Ingested::dropped`].
///
/// # Examples
///
/// ```
/// use u_throughput::grouping::ModelCanonicalizer;
/// use u_throughput::table::{ingest, ColumnSchema, RawTable};
///
/// let mut table = RawTable::new(["product_id", "model_id", "throughput"]);
/// table.push_row(["bom-1", "wb3100-a", "800"]);
/// table.push_row(["bom-1", "wb3100-b", "n/a"]);
///
/// let canon = ModelCanonicalizer::new(["WB3100"]);
/// let out = ingest(&table, &ColumnSchema::default(), &canon, false).unwrap();
/// assert_eq!(out.measurements.len(), 1);
/// assert_eq!(out.measurements[0].model_id, "WB3100");
/// assert_eq!(out.dropped.unparsable_throughput, 1);
/// ```
pub fn ingest(
    table: &RawTable,
    schema: &ColumnSchema,
    canonicalizer: &ModelCanonicalizer,
    require_secondary: bool,
) -> Result<Ingested> {
    let cols = schema.resolve(table, require_secondary)?;

    let mut out = Ingested::default();
    for row in 0..table.len() {
        let Some(throughput) = parse_throughput(table.cell(row, cols.throughput)) else {
            out.dropped.unparsable_throughput += 1;
            continue;
        };
        if throughput <= 0.0 {
            out.dropped.non_positive_throughput += 1;
            continue;
        }

        let product_id = clean_product_id(table.cell(row, cols.product_id));
        let model_id = canonicalizer.canonicalize(table.cell(row, cols.model_id));
        if product_id.is_empty() || model_id.is_empty() {
            out.dropped.missing_identifier += 1;
            continue;
        }

        let secondary = cols
            .secondary_dimension
            .map(|c| clean_identifier(table.cell(row, c)))
            .filter(|s| !s.is_empty());
        let timestamp = cols
            .timestamp
            .map(|c| table.cell(row, c).trim().to_string())
            .filter(|s| !s.is_empty());

        out.measurements.push(Measurement {
            row,
            product_id,
            model_id,
            throughput,
            secondary,
            timestamp,
        });
    }

    if out.dropped.total() > 0 {
        warn!(
            unparsable_throughput = out.dropped.unparsable_throughput,
            non_positive_throughput = out.dropped.non_positive_throughput,
            missing_identifier = out.dropped.missing_identifier,
            "dropped rows during coercion"
        );
    }
    Ok(out)
}
