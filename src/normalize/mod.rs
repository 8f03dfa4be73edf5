//! Synonym Normalizer (C2) — maps free-text surface forms to canonical
//! reference identifiers using a static dictionary.
//!
//! Grounded on `config.rs`'s `BackendEntry`/`OcrConfig` pattern of a small,
//! serde-deserializable static dictionary with a tolerant fallback when the
//! source file is missing or malformed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A synonym category. Vendors get substring matching in addition to exact
/// match (spec §4.2 rule 3); the others only get case-insensitive exact
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Vendors,
    Materials,
    Sources,
    Destinations,
}

/// `{category: {surface -> canonical}}`, loaded from a TOML/JSON dictionary
/// file at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynonymDictionary {
    #[serde(default)]
    pub vendors: HashMap<String, String>,
    #[serde(default)]
    pub materials: HashMap<String, String>,
    #[serde(default)]
    pub sources: HashMap<String, String>,
    #[serde(default)]
    pub destinations: HashMap<String, String>,
}

impl SynonymDictionary {
    fn map_for(&self, category: Category) -> &HashMap<String, String> {
        match category {
            Category::Vendors => &self.vendors,
            Category::Materials => &self.materials,
            Category::Sources => &self.sources,
            Category::Destinations => &self.destinations,
        }
    }
}

/// Normalizes free text to canonical identifiers. Never returns `None` for
/// non-empty input — an unmapped surface form passes through trimmed
/// (spec §4.2 rule 4).
pub struct SynonymNormalizer {
    dictionary: SynonymDictionary,
}

impl SynonymNormalizer {
    pub fn new(dictionary: SynonymDictionary) -> Self {
        Self { dictionary }
    }

    /// Load a dictionary from a TOML file. On any I/O or parse failure,
    /// logs a warning and behaves as if the dictionary were empty — per
    /// spec §4.2's failure mode, downstream consumers must already tolerate
    /// unmapped values.
    pub fn from_toml_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(dictionary) => Self::new(dictionary),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "malformed synonym dictionary, using empty map");
                    Self::new(SynonymDictionary::default())
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "synonym dictionary not found, using empty map");
                Self::new(SynonymDictionary::default())
            }
        }
    }

    /// Normalize `surface` within `category` to a canonical identifier.
    pub fn normalize(&self, category: Category, surface: &str) -> String {
        let trimmed = surface.trim();
        if trimmed.is_empty() {
            return trimmed.to_string();
        }

        let map = self.dictionary.map_for(category);

        // Rule 2: case-insensitive exact match.
        let lower = trimmed.to_ascii_lowercase();
        for (key, canonical) in map {
            if key.to_ascii_lowercase() == lower {
                return canonical.clone();
            }
        }

        // Rule 3: vendors only, bidirectional substring match.
        if category == Category::Vendors {
            for (key, canonical) in map {
                let key_lower = key.to_ascii_lowercase();
                if lower.contains(&key_lower) || key_lower.contains(&lower) {
                    return canonical.clone();
                }
            }
        }

        // Rule 4: unmapped input passes through unchanged.
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> SynonymDictionary {
        let mut vendors = HashMap::new();
        vendors.insert("WM".to_string(), "WASTE_MANAGEMENT".to_string());
        vendors.insert(
            "Waste Management Lewisville".to_string(),
            "WASTE_MANAGEMENT_LEWISVILLE".to_string(),
        );
        let mut materials = HashMap::new();
        materials.insert("non-contaminated".to_string(), "NON_CONTAMINATED".to_string());
        SynonymDictionary {
            vendors,
            materials,
            sources: HashMap::new(),
            destinations: HashMap::new(),
        }
    }

    #[test]
    fn trims_whitespace() {
        let n = SynonymNormalizer::new(dict());
        assert_eq!(n.normalize(Category::Materials, "  non-contaminated  "), "NON_CONTAMINATED");
    }

    #[test]
    fn case_insensitive_exact_match() {
        let n = SynonymNormalizer::new(dict());
        assert_eq!(n.normalize(Category::Materials, "NON-CONTAMINATED"), "NON_CONTAMINATED");
    }

    #[test]
    fn vendor_substring_match_is_bidirectional() {
        let n = SynonymNormalizer::new(dict());
        assert_eq!(n.normalize(Category::Vendors, "WM Trucking Co"), "WASTE_MANAGEMENT");
        assert_eq!(
            n.normalize(Category::Vendors, "Waste Management"),
            "WASTE_MANAGEMENT_LEWISVILLE"
        );
    }

    #[test]
    fn materials_do_not_get_substring_match() {
        let n = SynonymNormalizer::new(dict());
        // "non-contaminated soil" is not an exact match and materials get no
        // substring rule, so it should pass through unchanged (trimmed).
        assert_eq!(n.normalize(Category::Materials, "non-contaminated soil"), "non-contaminated soil");
    }

    #[test]
    fn unmapped_value_passes_through_trimmed() {
        let n = SynonymNormalizer::new(dict());
        assert_eq!(n.normalize(Category::Sources, "  North Lot  "), "North Lot");
    }

    #[test]
    fn missing_file_yields_empty_dictionary_behavior() {
        let n = SynonymNormalizer::from_toml_file(std::path::Path::new("/nonexistent/dict.toml"));
        assert_eq!(n.normalize(Category::Vendors, "Anything"), "Anything");
    }
}
