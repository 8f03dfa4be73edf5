use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_truck_tickets")
        .depends_on(&["0001_reference_tables"])
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    r#"CREATE TABLE truck_tickets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_number TEXT NOT NULL,
    ticket_date TEXT NOT NULL,

    job_id INTEGER NOT NULL REFERENCES jobs(id),
    material_id INTEGER NOT NULL REFERENCES materials(id),
    ticket_type_id INTEGER NOT NULL REFERENCES ticket_types(id),
    source_id INTEGER REFERENCES sources(id),
    destination_id INTEGER REFERENCES destinations(id),
    vendor_id INTEGER REFERENCES vendors(id),

    quantity TEXT NOT NULL,
    quantity_unit TEXT NOT NULL,
    truck_number TEXT,

    manifest_number TEXT,

    file_id TEXT NOT NULL,
    file_page INTEGER NOT NULL,
    file_hash TEXT NOT NULL,
    request_guid TEXT NOT NULL,
    confidence_score REAL NOT NULL,
    processed_by TEXT NOT NULL,

    review_required INTEGER NOT NULL DEFAULT 0,
    review_reason TEXT,
    duplicate_of INTEGER REFERENCES truck_tickets(id),

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
                )
                .for_backend(
                    "postgres",
                    r#"CREATE TABLE IF NOT EXISTS truck_tickets (
    id SERIAL PRIMARY KEY,
    ticket_number TEXT NOT NULL,
    ticket_date TEXT NOT NULL,

    job_id INTEGER NOT NULL REFERENCES jobs(id),
    material_id INTEGER NOT NULL REFERENCES materials(id),
    ticket_type_id INTEGER NOT NULL REFERENCES ticket_types(id),
    source_id INTEGER REFERENCES sources(id),
    destination_id INTEGER REFERENCES destinations(id),
    vendor_id INTEGER REFERENCES vendors(id),

    quantity TEXT NOT NULL,
    quantity_unit TEXT NOT NULL,
    truck_number TEXT,

    manifest_number TEXT,

    file_id TEXT NOT NULL,
    file_page INTEGER NOT NULL,
    file_hash TEXT NOT NULL,
    request_guid TEXT NOT NULL,
    confidence_score REAL NOT NULL,
    processed_by TEXT NOT NULL,

    review_required INTEGER NOT NULL DEFAULT 0,
    review_reason TEXT,
    duplicate_of INTEGER REFERENCES truck_tickets(id),

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    "CREATE UNIQUE INDEX idx_truck_tickets_number_vendor_live \
                     ON truck_tickets(ticket_number, vendor_id) WHERE duplicate_of IS NULL",
                )
                .for_backend(
                    "postgres",
                    "CREATE UNIQUE INDEX idx_truck_tickets_number_vendor_live \
                     ON truck_tickets(ticket_number, vendor_id) WHERE duplicate_of IS NULL",
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend("sqlite", "CREATE INDEX idx_truck_tickets_date ON truck_tickets(ticket_date)")
                .for_backend("postgres", "CREATE INDEX idx_truck_tickets_date ON truck_tickets(ticket_date)"),
        )
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    "CREATE INDEX idx_truck_tickets_job_date ON truck_tickets(job_id, ticket_date)",
                )
                .for_backend(
                    "postgres",
                    "CREATE INDEX idx_truck_tickets_job_date ON truck_tickets(job_id, ticket_date)",
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    "CREATE INDEX idx_truck_tickets_manifest ON truck_tickets(manifest_number) \
                     WHERE manifest_number IS NOT NULL",
                )
                .for_backend(
                    "postgres",
                    "CREATE INDEX idx_truck_tickets_manifest ON truck_tickets(manifest_number) \
                     WHERE manifest_number IS NOT NULL",
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    "CREATE INDEX idx_truck_tickets_request_guid ON truck_tickets(request_guid)",
                )
                .for_backend(
                    "postgres",
                    "CREATE INDEX idx_truck_tickets_request_guid ON truck_tickets(request_guid)",
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend("sqlite", "CREATE INDEX idx_truck_tickets_file_hash ON truck_tickets(file_hash)")
                .for_backend("postgres", "CREATE INDEX idx_truck_tickets_file_hash ON truck_tickets(file_hash)"),
        )
}
