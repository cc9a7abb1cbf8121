//! # u-throughput
//!
//! Adaptive outlier filtering and throughput normalization for
//! assembly-line UPH (units per hour) measurements.
//!
//! Raw UPH tables mix equipment models, products and package types, and are
//! polluted by stoppages, logging glitches and partial shifts. This crate
//! cleans each product/model group with an alternating Z-score / IQR filter,
//! divides throughput by a per-product complexity constant so different
//! products become comparable, and reports descriptive statistics with
//! self-referenced Cp/Cpk per group.
//!
//! ## Modules
//!
//! - [`table`] - Raw string tables, column mapping and row coercion
//! - [`grouping`] - Identifier cleaning, model families and grouping keys
//! - [`outlier`] - Z-score and IQR fences and the iterative filter
//! - [`lookup`] - Auxiliary per-product normalization constants
//! - [`normalize`] - Group-level and row-level normalization
//! - [`capability`] - Descriptive statistics and Cp/Cpk
//! - [`report`] - Summary rows, roll-ups and the run overview
//! - [`engine`] - The `normalize_and_filter` / `summarize` entry points
//! - [`config`] - Engine configuration and process presets
//! - [`error`] - Error types
//!
//! ## Quick start
//!
//! ```
//! use u_throughput::{AuxiliaryLookup, EngineConfig, RawTable, ThroughputEngine};
//!
//! let mut table = RawTable::new(["product_id", "model_id", "throughput"]);
//! for uph in [812.0, 798.5, 805.0] {
//!     table.push_row(["120045".to_string(), "WB3100-A".to_string(), uph.to_string()]);
//! }
//!
//! let engine = ThroughputEngine::new(EngineConfig::default()).unwrap();
//! let report = engine.analyze(&table, &AuxiliaryLookup::new()).unwrap();
//! assert_eq!(report.summaries.len(), 1);
//! assert_eq!(report.summaries[0].count_after, 3);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: output order follows grouping keys, never input order
//! - **Isolated groups**: one failing group never aborts the batch
//! - **Explicit fallbacks**: a missing divisor is reported, not hidden
//! - **Numerical stability**: Leverages `u-numflow` for statistics

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod lookup;
pub mod normalize;
pub mod outlier;
pub mod report;
pub mod table;

pub use config::EngineConfig;
pub use engine::{CleanedBatch, CleanedGroup, ThroughputEngine};
pub use error::{EngineError, Result};
pub use lookup::AuxiliaryLookup;
pub use report::SummaryReport;
pub use table::RawTable;
