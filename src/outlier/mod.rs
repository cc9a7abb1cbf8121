//! Iterative outlier filtering.
//!
//! Throughput logs contain machine stops, partial lots and typing errors
//! that a single Z-score pass cannot remove: one extreme value inflates the
//! standard deviation enough to mask the others. [`OutlierFilter`] therefore
//! alternates a Z-score pass with a Tukey IQR pass until the subset is stable
//! or a round bound is reached.
//!
//! # Policy
//!
//! - Fewer than 15 observations: no filtering (estimates are unreliable).
//! - Zero spread: the Z-score pass is a no-op, never a division by zero.
//! - At most 20 rounds; hitting the bound is reported, not fatal.
//!
//! # References
//!
//! - Tukey, J.W. (1977). *Exploratory Data Analysis*. Addison-Wesley.
//! - Iglewicz, B. & Hoaglin, D.C. (1993). *How to Detect and Handle
//!   Outliers*. ASQC Quality Press.

mod fences;
mod iterative;

pub use fences::{IqrFence, ZScoreFence};
pub use iterative::{FilterOutcome, OutlierFilter, Termination};
