//! Idempotent reference-data bootstrap (supplemented from
//! `database/seed_data.py`'s `seed_all_reference_data`): inserts the
//! canonical Job/Material/Source/Destination/Vendor/TicketType rows a fresh
//! database needs before the first batch can resolve foreign keys.
//!
//! Re-running against an already-seeded database is a no-op per row: each
//! insert is guarded by a `find_by_name` check first.

use chrono::NaiveDate;

use super::pool::DbError;
use super::reference::ReferenceRepository;
use crate::models::{Destination, Job, Material, MaterialClass, Source, TicketType, TicketTypeName, Vendor};

struct SeedMaterial {
    name: &'static str,
    class: MaterialClass,
    requires_manifest: bool,
}

const MATERIALS: &[SeedMaterial] = &[
    SeedMaterial { name: "CLASS_2_CONTAMINATED", class: MaterialClass::Contaminated, requires_manifest: true },
    SeedMaterial { name: "CLASS_3_CONTAMINATED", class: MaterialClass::Contaminated, requires_manifest: true },
    SeedMaterial { name: "NON_CONTAMINATED", class: MaterialClass::Clean, requires_manifest: false },
    SeedMaterial { name: "CLEAN_FILL", class: MaterialClass::Clean, requires_manifest: false },
    SeedMaterial { name: "SPOILS", class: MaterialClass::Spoils, requires_manifest: false },
    SeedMaterial { name: "GENERAL_WASTE", class: MaterialClass::Waste, requires_manifest: false },
    SeedMaterial { name: "ROCK", class: MaterialClass::Import, requires_manifest: false },
    SeedMaterial { name: "FLEXBASE", class: MaterialClass::Import, requires_manifest: false },
    SeedMaterial { name: "ASPHALT", class: MaterialClass::Import, requires_manifest: false },
    SeedMaterial { name: "CONCRETE", class: MaterialClass::Import, requires_manifest: false },
    SeedMaterial { name: "UTILITY_STONE", class: MaterialClass::Import, requires_manifest: false },
];

const TICKET_TYPES: &[TicketTypeName] = &[TicketTypeName::Import, TicketTypeName::Export, TicketTypeName::Transfer];

struct SeedVendor {
    name: &'static str,
    code: &'static str,
    contact_info: &'static str,
}

const VENDORS: &[SeedVendor] = &[
    SeedVendor { name: "WASTE_MANAGEMENT_DFW_RDF", code: "WM-DFW", contact_info: "Waste Management DFW RDF Facility" },
    SeedVendor {
        name: "WASTE_MANAGEMENT_SKYLINE_RDF",
        code: "WM-SKY",
        contact_info: "Waste Management Skyline RDF Facility",
    },
    SeedVendor {
        name: "WASTE_MANAGEMENT_LEWISVILLE",
        code: "WM-LWV",
        contact_info: "Waste Management Lewisville Landfill",
    },
    SeedVendor { name: "REPUBLIC_SERVICES", code: "REPUBLIC", contact_info: "Republic Services" },
    SeedVendor { name: "LDI_YARD", code: "LDI", contact_info: "Lindamood Disposal Inc. Yard" },
    SeedVendor { name: "POST_OAK_PIT", code: "POA", contact_info: "Post Oak Pit - Reuse Facility" },
    SeedVendor { name: "AUSTIN_ASPHALT", code: "AA", contact_info: "Austin Asphalt Plant" },
    SeedVendor { name: "ARCOSA_AGGREGATES", code: "ARCOSA", contact_info: "Arcosa Aggregates" },
    SeedVendor { name: "VULCAN_MATERIALS", code: "VULCAN", contact_info: "Vulcan Materials Company" },
    SeedVendor { name: "BECK_TRUCKING", code: "BECK", contact_info: "Beck Trucking - Spoils Hauling" },
    SeedVendor { name: "NTX_TRUCKING", code: "NTX", contact_info: "North Texas Trucking" },
    SeedVendor { name: "UTX_TRUCKING", code: "UTX", contact_info: "Universal Texas Trucking" },
];

struct SeedDestination {
    name: &'static str,
    facility_type: &'static str,
    address: &'static str,
    requires_manifest: bool,
}

const DESTINATIONS: &[SeedDestination] = &[
    SeedDestination {
        name: "WASTE_MANAGEMENT_DFW_RDF",
        facility_type: "DISPOSAL",
        address: "DFW RDF Facility, Lewisville, TX",
        requires_manifest: true,
    },
    SeedDestination {
        name: "WASTE_MANAGEMENT_SKYLINE_RDF",
        facility_type: "DISPOSAL",
        address: "Skyline RDF Facility, Arlington, TX",
        requires_manifest: true,
    },
    SeedDestination {
        name: "WASTE_MANAGEMENT_LEWISVILLE",
        facility_type: "DISPOSAL",
        address: "Waste Management Lewisville Landfill, Lewisville, TX",
        requires_manifest: true,
    },
    SeedDestination {
        name: "REPUBLIC_SERVICES",
        facility_type: "DISPOSAL",
        address: "Republic Services Landfill, TX",
        requires_manifest: true,
    },
    SeedDestination {
        name: "LDI_YARD",
        facility_type: "DISPOSAL",
        address: "Lindamood Disposal Inc. Yard, TX",
        requires_manifest: false,
    },
    SeedDestination { name: "POST_OAK_PIT", facility_type: "REUSE", address: "Post Oak Pit, TX", requires_manifest: false },
    SeedDestination {
        name: "BECK_SPOILS",
        facility_type: "REUSE",
        address: "Beck Spoils Site, TX",
        requires_manifest: false,
    },
    SeedDestination {
        name: "NTX_SPOILS",
        facility_type: "REUSE",
        address: "North Texas Spoils Site, TX",
        requires_manifest: false,
    },
    SeedDestination {
        name: "UTX_SPOILS",
        facility_type: "REUSE",
        address: "Universal Texas Spoils Site, TX",
        requires_manifest: false,
    },
    SeedDestination {
        name: "AUSTIN_ASPHALT_PLANT",
        facility_type: "SUPPLIER",
        address: "Austin Asphalt Plant, Austin, TX",
        requires_manifest: false,
    },
    SeedDestination {
        name: "ARCOSA_PLANT",
        facility_type: "SUPPLIER",
        address: "Arcosa Aggregates Plant, TX",
        requires_manifest: false,
    },
    SeedDestination {
        name: "VULCAN_PLANT",
        facility_type: "SUPPLIER",
        address: "Vulcan Materials Plant, TX",
        requires_manifest: false,
    },
];

const SOURCE_NAMES: &[(&str, &str)] = &[
    ("PIER_EX", "Pier Excavation Area"),
    ("MSE_WALL", "Mechanically Stabilized Earth Wall Area"),
    ("SOUTH_MSE_WALL", "South MSE Wall Section"),
    ("ZONE_E_GARAGE", "Zone E Garage Structure"),
    ("SPG", "South Parking Garage"),
    ("SOUTH_PARKING_GARAGE", "South Parking Garage Structure"),
    ("PODIUM", "Terminal Podium Structure"),
    ("TERMINAL_FOUNDATION", "Main Terminal Foundation"),
    ("POND", "Storm Water Pond Construction"),
    ("SOUTH_FILL", "South Site Fill Area"),
    ("TRACT_2", "Tract 2 Development Area"),
    ("BECK_SPOILS", "Beck Spoils Storage Area"),
    ("NTX_SPOILS", "North Texas Spoils Storage"),
    ("UTX_SPOILS", "Universal Texas Spoils Storage"),
    ("UTILITY_CORRIDOR", "Utility Installation Corridor"),
    ("ROAD_WIDENING", "Access Road Widening Area"),
];

/// Insert `value` if no row with its name exists yet, returning its id
/// either way.
async fn upsert_job(repo: &ReferenceRepository, job: &Job) -> Result<i64, DbError> {
    match repo.find_job_by_name(&job.name).await? {
        Some(existing) => Ok(existing.id),
        None => repo.insert_job(job).await,
    }
}

async fn upsert_material(repo: &ReferenceRepository, material: &Material) -> Result<i64, DbError> {
    match repo.find_material_by_name(&material.name).await? {
        Some(existing) => Ok(existing.id),
        None => repo.insert_material(material).await,
    }
}

async fn upsert_ticket_type(repo: &ReferenceRepository, name: TicketTypeName) -> Result<i64, DbError> {
    match repo.find_ticket_type_by_name(name.as_str()).await? {
        Some(existing) => Ok(existing.id),
        None => repo.insert_ticket_type(&TicketType { id: 0, name }).await,
    }
}

async fn upsert_vendor(repo: &ReferenceRepository, vendor: &Vendor) -> Result<i64, DbError> {
    match repo.find_vendor_by_name(&vendor.name).await? {
        Some(existing) => Ok(existing.id),
        None => repo.insert_vendor(vendor).await,
    }
}

async fn upsert_destination(repo: &ReferenceRepository, destination: &Destination) -> Result<i64, DbError> {
    match repo.find_destination_by_name(&destination.name).await? {
        Some(existing) => Ok(existing.id),
        None => repo.insert_destination(destination).await,
    }
}

async fn upsert_source(repo: &ReferenceRepository, source: &Source) -> Result<i64, DbError> {
    match repo.find_source_by_name(&source.name).await? {
        Some(existing) => Ok(existing.id),
        None => repo.insert_source(source).await,
    }
}

/// Seed the canonical reference rows for `job_code`, creating the primary
/// job plus its two phases and every fixed material/vendor/destination/
/// ticket-type/source row. Safe to call on every batch startup.
pub async fn seed_defaults(repo: &ReferenceRepository, job_code: &str) -> Result<(), DbError> {
    tracing::info!(job_code, "seeding reference data");

    let primary_job_id = upsert_job(
        repo,
        &Job {
            id: 0,
            code: job_code.to_string(),
            name: "Construction Site Material Tracking".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid constant date"),
            end_date: Some(NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid constant date")),
        },
    )
    .await?;

    upsert_job(
        repo,
        &Job {
            id: 0,
            code: format!("{job_code}-PHASE1"),
            name: "Terminal Development - Phase 1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid constant date"),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid constant date")),
        },
    )
    .await?;

    upsert_job(
        repo,
        &Job {
            id: 0,
            code: format!("{job_code}-PHASE2"),
            name: "Terminal Development - Phase 2".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid constant date"),
            end_date: Some(NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid constant date")),
        },
    )
    .await?;

    for material in MATERIALS {
        upsert_material(
            repo,
            &Material {
                id: 0,
                name: material.name.to_string(),
                class: material.class,
                requires_manifest: material.requires_manifest,
            },
        )
        .await?;
    }

    for ticket_type in TICKET_TYPES {
        upsert_ticket_type(repo, *ticket_type).await?;
    }

    for vendor in VENDORS {
        upsert_vendor(
            repo,
            &Vendor {
                id: 0,
                name: vendor.name.to_string(),
                code: Some(vendor.code.to_string()),
                contact_info: Some(vendor.contact_info.to_string()),
            },
        )
        .await?;
    }

    for destination in DESTINATIONS {
        upsert_destination(
            repo,
            &Destination {
                id: 0,
                name: destination.name.to_string(),
                facility_type: Some(destination.facility_type.to_string()),
                address: Some(destination.address.to_string()),
                requires_manifest: destination.requires_manifest,
            },
        )
        .await?;
    }

    for (name, description) in SOURCE_NAMES {
        upsert_source(
            repo,
            &Source {
                id: 0,
                name: name.to_string(),
                job_id: Some(primary_job_id),
                description: Some(description.to_string()),
            },
        )
        .await?;
    }

    tracing::info!("reference data seeded");
    Ok(())
}
