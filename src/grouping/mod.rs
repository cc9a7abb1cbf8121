//! Grouping key resolution.
//!
//! A measurement belongs to the population identified by its product id and
//! canonical model id, optionally refined by a secondary dimension such as a
//! package code. Model ids are collapsed into configured families first so
//! that suffix variants of one machine type do not split a population.
//!
//! All functions here are pure and never fail: malformed identifiers are
//! cleaned, and an identifier that cleans to the empty string is rejected
//! upstream during ingestion.

mod identifier;
mod key;

pub use identifier::{clean_identifier, clean_product_id, ModelCanonicalizer};
pub use key::{partition, GroupKey};
