//! # Taxonomy Module
//!
//! Fixed product-type taxonomy and reconciliation of sparse category results against it
//!
//! ## Key Components
//! - [`ProductType`] - Ordered enumeration of the chain's product categories
//! - [`Taxonomy`] - Ordered, de-duplicated list of known category keys
//! - [`merge`] - One entry per known key, zero placeholders for missing ones

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::ranking::CategoryEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Frames,
    Sunglasses,
    OphthalmicLenses,
    ContactLenses,
    LensCare,
    Accessories,
}

impl ProductType {
    /// Canonical display order of the category cards.
    pub const ALL: [ProductType; 6] = [
        ProductType::Frames,
        ProductType::Sunglasses,
        ProductType::OphthalmicLenses,
        ProductType::ContactLenses,
        ProductType::LensCare,
        ProductType::Accessories,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ProductType::Frames => "FRAMES",
            ProductType::Sunglasses => "SUNGLASSES",
            ProductType::OphthalmicLenses => "OPHTHALMIC_LENSES",
            ProductType::ContactLenses => "CONTACT_LENSES",
            ProductType::LensCare => "LENS_CARE",
            ProductType::Accessories => "ACCESSORIES",
        }
    }

    /// Lenient lookup: case-insensitive, `-` and spaces read as `_`.
    pub fn from_key(key: &str) -> Option<ProductType> {
        let normalized = key.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        KEY_MAP.get(normalized.as_str()).copied()
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

lazy_static! {
    static ref KEY_MAP: HashMap<&'static str, ProductType> = {
        let mut map = HashMap::new();
        for product_type in ProductType::ALL {
            map.insert(product_type.key(), product_type);
        }
        map
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Taxonomy {
    keys: Vec<String>,
}

impl From<Vec<String>> for Taxonomy {
    fn from(keys: Vec<String>) -> Self {
        Self::from_keys(keys)
    }
}

impl From<Taxonomy> for Vec<String> {
    fn from(taxonomy: Taxonomy) -> Self {
        taxonomy.keys
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::from_keys(ProductType::ALL.iter().map(|p| p.key()))
    }
}

impl Taxonomy {
    /// Later duplicates are dropped so every key appears once.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let keys = keys
            .into_iter()
            .map(Into::into)
            .filter(|key: &String| seen.insert(key.clone()))
            .collect();
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn merge(&self, sparse: &HashMap<String, CategoryEntry>) -> Vec<CategoryEntry> {
        merge(&self.keys, sparse)
    }
}

/// Index entries by category key; a repeated key keeps the last entry.
pub fn index_by_key(entries: Vec<CategoryEntry>) -> HashMap<String, CategoryEntry> {
    entries
        .into_iter()
        .map(|entry| (entry.category_key.clone(), entry))
        .collect()
}

/// One entry per element of `known_keys`, in that order. Missing keys get a
/// zero placeholder; keys outside `known_keys` are dropped.
pub fn merge<S: AsRef<str>>(known_keys: &[S], sparse: &HashMap<String, CategoryEntry>) -> Vec<CategoryEntry> {
    let unknown = sparse
        .keys()
        .filter(|key| !known_keys.iter().any(|k| k.as_ref() == key.as_str()))
        .count();
    if unknown > 0 {
        debug!("Dropping {} categories outside the known taxonomy", unknown);
    }

    known_keys
        .iter()
        .map(|key| {
            let key = key.as_ref();
            match sparse.get(key) {
                Some(entry) => entry.clone(),
                None => CategoryEntry::placeholder(key),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_fills_missing_in_known_order() {
        let mut sparse = HashMap::new();
        sparse.insert("B".to_string(), CategoryEntry::new("B", 5.0));

        let merged = merge(&["A", "B", "C"], &sparse);
        let summary: Vec<(&str, f64)> = merged
            .iter()
            .map(|e| (e.category_key.as_str(), e.metric_primary))
            .collect();
        assert_eq!(summary, vec![("A", 0.0), ("B", 5.0), ("C", 0.0)]);
        assert_eq!(merged[0].metric_secondary, Some(0.0));
        assert_eq!(merged[1].metric_secondary, None);
    }

    #[test]
    fn test_merge_drops_unknown_categories() {
        let sparse = index_by_key(vec![
            CategoryEntry::new("FRAMES", 10.0),
            CategoryEntry::new("GIFT_CARDS", 99.0),
        ]);
        let merged = Taxonomy::default().merge(&sparse);

        assert_eq!(merged.len(), ProductType::ALL.len());
        assert!(merged.iter().all(|e| e.category_key != "GIFT_CARDS"));
        assert_eq!(merged[0].category_key, "FRAMES");
        assert_eq!(merged[0].metric_primary, 10.0);
    }

    #[test]
    fn test_merge_empty_source_keeps_every_card() {
        let merged = Taxonomy::default().merge(&HashMap::new());
        let keys: Vec<&str> = merged.iter().map(|e| e.category_key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["FRAMES", "SUNGLASSES", "OPHTHALMIC_LENSES", "CONTACT_LENSES", "LENS_CARE", "ACCESSORIES"]
        );
        assert!(merged.iter().all(|e| e.metric_primary == 0.0));
    }

    #[test]
    fn test_taxonomy_deduplicates_keys() {
        let taxonomy = Taxonomy::from_keys(["A", "B", "A", "C"]);
        assert_eq!(taxonomy.keys(), &["A", "B", "C"]);
        assert!(taxonomy.contains("B"));
    }

    #[test]
    fn test_product_type_lookup() {
        assert_eq!(ProductType::from_key("contact-lenses"), Some(ProductType::ContactLenses));
        assert_eq!(ProductType::from_key(" frames "), Some(ProductType::Frames));
        assert_eq!(ProductType::from_key("lens care"), Some(ProductType::LensCare));
        assert_eq!(ProductType::from_key("hats"), None);
        assert_eq!(
            serde_json::to_string(&ProductType::OphthalmicLenses).unwrap(),
            "\"OPHTHALMIC_LENSES\""
        );
    }
}
