//! Process capability analysis.
//!
//! Computes descriptive statistics and capability indices for cleaned
//! throughput groups.
//!
//! # Indices
//!
//! - **Cp** - Potential capability (spread vs window)
//! - **Cpk** - Actual capability (centering considered)
//!
//! [`ProcessCapability`] works against an explicit window;
//! [`ObservedCapability`] derives the window from the group's own
//! mean ± 3σ, which is what throughput summaries report.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod indices;
mod observed;

pub use indices::{CapabilityIndices, ProcessCapability};
pub use observed::{Descriptive, ObservedCapability};
