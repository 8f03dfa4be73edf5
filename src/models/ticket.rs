//! The `TruckTicket` transactional entity (spec §3) and its supporting
//! value types.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unit of measure for a ticket's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityUnit {
    Tons,
    CubicYards,
    Lbs,
    Loads,
}

impl QuantityUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityUnit::Tons => "TONS",
            QuantityUnit::CubicYards => "CY",
            QuantityUnit::Lbs => "LBS",
            QuantityUnit::Loads => "LOADS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TONS" | "TON" => Some(QuantityUnit::Tons),
            "CY" | "CUBIC YARDS" | "CUBIC YARD" => Some(QuantityUnit::CubicYards),
            "LBS" | "LB" | "POUNDS" => Some(QuantityUnit::Lbs),
            "LOADS" | "LOAD" => Some(QuantityUnit::Loads),
            _ => None,
        }
    }
}

/// One row per accepted page (spec §3 `TruckTicket`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckTicket {
    pub id: i64,
    pub ticket_number: String,
    pub ticket_date: NaiveDate,

    pub job_id: i64,
    pub material_id: i64,
    pub ticket_type_id: i64,
    pub source_id: Option<i64>,
    pub destination_id: Option<i64>,
    pub vendor_id: Option<i64>,

    pub quantity: BigDecimal,
    pub quantity_unit: QuantityUnit,
    pub truck_number: Option<String>,

    pub manifest_number: Option<String>,

    pub file_id: String,
    pub file_page: u32,
    pub file_hash: String,
    pub request_guid: String,
    pub confidence_score: f32,
    pub processed_by: String,

    pub review_required: bool,
    pub review_reason: Option<String>,
    pub duplicate_of: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The subset of ticket fields supplied by the page pipeline before
/// persistence resolves surrogate keys and audit columns.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub ticket_number: String,
    pub ticket_date: NaiveDate,

    pub job_name: String,
    pub material_name: String,
    pub ticket_type: super::reference::TicketTypeName,
    pub source_name: Option<String>,
    pub destination_name: Option<String>,
    pub vendor_name: Option<String>,

    pub quantity: BigDecimal,
    pub quantity_unit: QuantityUnit,
    pub truck_number: Option<String>,

    pub manifest_number: Option<String>,

    pub file_id: String,
    pub file_page: u32,
    pub file_hash: String,
    pub request_guid: String,
    pub confidence_score: f32,
    pub processed_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_unit_parse_handles_aliases() {
        assert_eq!(QuantityUnit::parse("tons"), Some(QuantityUnit::Tons));
        assert_eq!(QuantityUnit::parse("CUBIC YARDS"), Some(QuantityUnit::CubicYards));
        assert_eq!(QuantityUnit::parse("cy"), Some(QuantityUnit::CubicYards));
        assert_eq!(QuantityUnit::parse("loads"), Some(QuantityUnit::Loads));
        assert_eq!(QuantityUnit::parse("gallons"), None);
    }
}
