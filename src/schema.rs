//! Diesel table definitions, hand-written to match the migrations in
//! `migrations/` rather than generated by `diesel print-schema` — same
//! arrangement as the teacher's `schema.rs`.
//!
//! Dates and timestamps are stored as ISO-8601 `Text` (not diesel's typed
//! `Date`/`Timestamp`) and booleans as `Integer` 0/1, matching the teacher's
//! convention of hand-parsing with `chrono` at the repository boundary
//! rather than relying on SQLite's weak column typing.

diesel::table! {
    jobs (id) {
        id -> Integer,
        code -> Text,
        name -> Text,
        start_date -> Text,
        end_date -> Nullable<Text>,
    }
}

diesel::table! {
    materials (id) {
        id -> Integer,
        name -> Text,
        class -> Text,
        requires_manifest -> Integer,
    }
}

diesel::table! {
    sources (id) {
        id -> Integer,
        name -> Text,
        job_id -> Nullable<Integer>,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    destinations (id) {
        id -> Integer,
        name -> Text,
        facility_type -> Nullable<Text>,
        address -> Nullable<Text>,
        requires_manifest -> Integer,
    }
}

diesel::table! {
    vendors (id) {
        id -> Integer,
        name -> Text,
        code -> Nullable<Text>,
        contact_info -> Nullable<Text>,
    }
}

diesel::table! {
    ticket_types (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    truck_tickets (id) {
        id -> Integer,
        ticket_number -> Text,
        ticket_date -> Text,

        job_id -> Integer,
        material_id -> Integer,
        ticket_type_id -> Integer,
        source_id -> Nullable<Integer>,
        destination_id -> Nullable<Integer>,
        vendor_id -> Nullable<Integer>,

        quantity -> Text,
        quantity_unit -> Text,
        truck_number -> Nullable<Text>,

        manifest_number -> Nullable<Text>,

        file_id -> Text,
        file_page -> Integer,
        file_hash -> Text,
        request_guid -> Text,
        confidence_score -> Float,
        processed_by -> Text,

        review_required -> Integer,
        review_reason -> Nullable<Text>,
        duplicate_of -> Nullable<Integer>,

        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    review_queue_entries (id) {
        id -> Integer,
        ticket_id -> Nullable<Integer>,
        file_id -> Text,
        file_page -> Integer,
        reason -> Text,
        severity -> Text,
        file_path -> Text,
        page_num -> Integer,
        detected_fields -> Text,
        suggested_fixes -> Text,
        resolved -> Integer,
        resolved_by -> Nullable<Text>,
        resolved_at -> Nullable<Text>,
        created_at -> Text,
    }
}

diesel::table! {
    processing_runs (id) {
        id -> Integer,
        request_guid -> Text,
        started_at -> Text,
        completed_at -> Nullable<Text>,
        processed_by -> Text,
        status -> Text,
        config_snapshot -> Text,
        files -> Integer,
        pages -> Integer,
        tickets_created -> Integer,
        tickets_updated -> Integer,
        duplicates_found -> Integer,
        review_queue_count -> Integer,
        error_count -> Integer,
    }
}

diesel::joinable!(truck_tickets -> jobs (job_id));
diesel::joinable!(truck_tickets -> materials (material_id));
diesel::joinable!(truck_tickets -> ticket_types (ticket_type_id));
diesel::joinable!(sources -> jobs (job_id));

diesel::allow_tables_to_appear_in_same_query!(
    jobs,
    materials,
    sources,
    destinations,
    vendors,
    ticket_types,
    truck_tickets,
    review_queue_entries,
    processing_runs,
);
