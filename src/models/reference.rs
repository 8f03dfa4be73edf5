//! Reference entities: small, mostly-immutable rows loaded once per run and
//! resolved by canonical name through [`crate::cache::ReferenceCache`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A construction project that tickets are billed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// The regulatory class of a material. Drives the manifest-required default
/// used when a destination override is absent (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialClass {
    Contaminated,
    Clean,
    Waste,
    Import,
    Spoils,
}

impl MaterialClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialClass::Contaminated => "CONTAMINATED",
            MaterialClass::Clean => "CLEAN",
            MaterialClass::Waste => "WASTE",
            MaterialClass::Import => "IMPORT",
            MaterialClass::Spoils => "SPOILS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CONTAMINATED" => Some(MaterialClass::Contaminated),
            "CLEAN" => Some(MaterialClass::Clean),
            "WASTE" => Some(MaterialClass::Waste),
            "IMPORT" => Some(MaterialClass::Import),
            "SPOILS" => Some(MaterialClass::Spoils),
            _ => None,
        }
    }
}

/// A material reference row. `requires_manifest` is the single source of
/// truth for the material-level half of the manifest rule — see
/// DESIGN.md's Open Question #2 for why `Spoils` defaults to `false` here
/// and is instead forced by a destination override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub class: MaterialClass,
    pub requires_manifest: bool,
}

/// An on-site location or originating sub-area within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub job_id: Option<i64>,
    pub description: Option<String>,
}

/// A disposal/transfer facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,
    pub name: String,
    pub facility_type: Option<String>,
    pub address: Option<String>,
    pub requires_manifest: bool,
}

/// A vendor/hauler issuing tickets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub contact_info: Option<String>,
}

/// The direction of a ticket's material flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketTypeName {
    Export,
    Import,
    Transfer,
}

impl TicketTypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketTypeName::Export => "EXPORT",
            TicketTypeName::Import => "IMPORT",
            TicketTypeName::Transfer => "TRANSFER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EXPORT" => Some(TicketTypeName::Export),
            "IMPORT" => Some(TicketTypeName::Import),
            "TRANSFER" => Some(TicketTypeName::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i64,
    pub name: TicketTypeName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_class_round_trips() {
        for class in [
            MaterialClass::Contaminated,
            MaterialClass::Clean,
            MaterialClass::Waste,
            MaterialClass::Import,
            MaterialClass::Spoils,
        ] {
            assert_eq!(MaterialClass::parse(class.as_str()), Some(class));
        }
    }

    #[test]
    fn ticket_type_parse_is_case_insensitive() {
        assert_eq!(TicketTypeName::parse("export"), Some(TicketTypeName::Export));
        assert_eq!(TicketTypeName::parse("EXPORT"), Some(TicketTypeName::Export));
        assert_eq!(TicketTypeName::parse("bogus"), None);
    }
}
