//! Identifier cleaning and model-family canonicalization.

use serde::{Deserialize, Serialize};

/// Trims, strips embedded line breaks and upper-cases an identifier.
///
/// ```
/// use u_throughput::grouping::clean_identifier;
///
/// assert_eq!(clean_identifier("  wb3100-a\r\n"), "WB3100-A");
/// ```
pub fn clean_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .to_uppercase()
}

/// Cleans a product identifier.
///
/// Besides [`clean_identifier`], drops a trailing `.0` left behind when a
/// spreadsheet stored a numeric BOM number as a float.
///
/// ```
/// use u_throughput::grouping::clean_product_id;
///
/// assert_eq!(clean_product_id(" 120045.0 "), "120045");
/// assert_eq!(clean_product_id("bom-7.05"), "BOM-7.05");
/// ```
pub fn clean_product_id(raw: &str) -> String {
    let cleaned = clean_identifier(raw);
    match cleaned.strip_suffix(".0") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => cleaned,
    }
}

/// Collapses model-suffix variants into their canonical family.
///
/// A cleaned model id that contains a configured family string is replaced by
/// that family; otherwise the cleaned id is kept verbatim. Families are tried
/// in configuration order.
///
/// # Examples
///
/// ```
/// use u_throughput::grouping::ModelCanonicalizer;
///
/// let canon = ModelCanonicalizer::new(["WB3100"]);
/// assert_eq!(canon.canonicalize("wb3100-plus"), "WB3100");
/// assert_eq!(canon.canonicalize("EAGLE-60"), "EAGLE-60");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCanonicalizer {
    families: Vec<String>,
}

impl ModelCanonicalizer {
    /// Creates a canonicalizer from family names. Names are cleaned the same
    /// way model ids are, and empty names are ignored.
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            families: families
                .into_iter()
                .map(|f| clean_identifier(f.as_ref()))
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    /// The cleaned family list.
    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Returns the canonical model id for `raw`.
    pub fn canonicalize(&self, raw: &str) -> String {
        let cleaned = clean_identifier(raw);
        self.families
            .iter()
            .find(|family| cleaned.contains(family.as_str()))
            .cloned()
            .unwrap_or(cleaned)
    }
}
