//! Manifest Validator (C5) — "contaminated material ⇒ manifest present and
//! well-formed" (spec §4.5). This is the component backing the 100% recall
//! property P1.

use crate::models::Severity;

const CONTAMINATED_LITERAL_NAMES: &[&str] =
    &["CLASS_2_CONTAMINATED", "CLASS_2", "CONTAMINATED_SOIL", "HAZARDOUS"];

const EXPLICITLY_CLEAN_NAMES: &[&str] =
    &["NON_CONTAMINATED", "NON-CONTAMINATED", "CLEAN", "SPOILS", "IMPORT"];

/// Facilities that require a manifest regardless of material (spec §4.5,
/// §6 Open Question — WM Lewisville is the reference example).
const MANIFEST_REQUIRED_DESTINATIONS: &[&str] = &["WASTE_MANAGEMENT_LEWISVILLE"];

/// `requires_manifest(material_name?, destination_name?) -> bool` (spec §4.5).
pub fn requires_manifest(material_name: Option<&str>, destination_name: Option<&str>) -> bool {
    if let Some(material) = material_name {
        let upper = material.trim().to_ascii_uppercase();
        if CONTAMINATED_LITERAL_NAMES.contains(&upper.as_str()) {
            return true;
        }
        if upper.contains("CONTAMINATED") && !EXPLICITLY_CLEAN_NAMES.contains(&upper.as_str()) {
            return true;
        }
    }
    if let Some(destination) = destination_name {
        let upper = destination.trim().to_ascii_uppercase();
        if MANIFEST_REQUIRED_DESTINATIONS.contains(&upper.as_str()) {
            return true;
        }
    }
    false
}

/// A manifest number is well-formed iff, after trimming and upper-casing,
/// it is 8-20 characters matching `^[A-Z0-9_-]+$` (spec §4.5).
pub fn is_well_formed(manifest_number: &str) -> bool {
    let value = manifest_number.trim();
    if value.len() < 8 || value.len() > 20 {
        return false;
    }
    value.to_ascii_uppercase().bytes().all(|b| {
        b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_' || b == b'-'
    })
}

/// Outcome of validating a ticket's manifest against its material and
/// destination (spec §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestValidation {
    pub is_valid: bool,
    pub severity: Severity,
    reason: Option<&'static str>,
}

impl ManifestValidation {
    /// The review-queue reason for a failed validation. Panics if called on
    /// a valid result — callers must check `is_valid` first (mirrored by
    /// `TicketError::review_reason`, which only calls this for failures).
    pub fn reason(&self) -> &'static str {
        self.reason.expect("reason() called on a valid ManifestValidation")
    }

    fn ok() -> Self {
        Self { is_valid: true, severity: Severity::Info, reason: None }
    }

    fn missing() -> Self {
        Self { is_valid: false, severity: Severity::Critical, reason: Some("MISSING_MANIFEST") }
    }

    fn malformed() -> Self {
        Self { is_valid: false, severity: Severity::Warning, reason: Some("INVALID_MANIFEST_FORMAT") }
    }
}

/// Validate `manifest_number` for a ticket whose material/destination names
/// are already resolved to canonical form (spec §4.5 outcomes table).
pub fn validate_manifest(
    material_name: Option<&str>,
    destination_name: Option<&str>,
    manifest_number: Option<&str>,
) -> ManifestValidation {
    if !requires_manifest(material_name, destination_name) {
        return ManifestValidation::ok();
    }

    match manifest_number.map(str::trim).filter(|v| !v.is_empty()) {
        None => ManifestValidation::missing(),
        Some(value) => {
            if is_well_formed(value) {
                ManifestValidation::ok()
            } else {
                ManifestValidation::malformed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contaminated_literal_requires_manifest() {
        assert!(requires_manifest(Some("Class_2_Contaminated"), None));
    }

    #[test]
    fn generic_contaminated_substring_requires_manifest() {
        assert!(requires_manifest(Some("contaminated fill"), None));
    }

    #[test]
    fn explicitly_clean_names_do_not_require_manifest() {
        assert!(!requires_manifest(Some("non-contaminated"), None));
        assert!(!requires_manifest(Some("spoils"), None));
    }

    #[test]
    fn manifest_required_destination_overrides_clean_material() {
        assert!(requires_manifest(Some("CLEAN"), Some("Waste Management Lewisville")));
    }

    #[test]
    fn neither_material_nor_destination_requires_manifest_by_default() {
        assert!(!requires_manifest(Some("CLEAN"), Some("Generic Landfill")));
        assert!(!requires_manifest(None, None));
    }

    #[test]
    fn well_formed_checks_length_and_charset() {
        assert!(is_well_formed("WM-MAN-2024-000512"));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed("has a space in it!!"));
    }

    #[test]
    fn not_required_is_valid_info() {
        let v = validate_manifest(Some("CLEAN"), Some("Generic Landfill"), None);
        assert!(v.is_valid);
        assert_eq!(v.severity, Severity::Info);
    }

    #[test]
    fn required_and_missing_is_critical() {
        let v = validate_manifest(Some("CONTAMINATED_SOIL"), None, None);
        assert!(!v.is_valid);
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.reason(), "MISSING_MANIFEST");
    }

    #[test]
    fn required_and_malformed_is_warning() {
        let v = validate_manifest(Some("HAZARDOUS"), None, Some("bad!!"));
        assert!(!v.is_valid);
        assert_eq!(v.severity, Severity::Warning);
        assert_eq!(v.reason(), "INVALID_MANIFEST_FORMAT");
    }

    #[test]
    fn required_and_well_formed_is_valid() {
        let v = validate_manifest(Some("HAZARDOUS"), None, Some("WM-MAN-2024-000512"));
        assert!(v.is_valid);
        assert_eq!(v.severity, Severity::Info);
    }
}
