use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0004_processing_runs")
        .depends_on(&["0001_reference_tables"])
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    r#"CREATE TABLE processing_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_guid TEXT NOT NULL UNIQUE,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    processed_by TEXT NOT NULL,
    status TEXT NOT NULL,
    config_snapshot TEXT NOT NULL DEFAULT '{}',
    files INTEGER NOT NULL DEFAULT 0,
    pages INTEGER NOT NULL DEFAULT 0,
    tickets_created INTEGER NOT NULL DEFAULT 0,
    tickets_updated INTEGER NOT NULL DEFAULT 0,
    duplicates_found INTEGER NOT NULL DEFAULT 0,
    review_queue_count INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0
)"#,
                )
                .for_backend(
                    "postgres",
                    r#"CREATE TABLE IF NOT EXISTS processing_runs (
    id SERIAL PRIMARY KEY,
    request_guid TEXT NOT NULL UNIQUE,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    processed_by TEXT NOT NULL,
    status TEXT NOT NULL,
    config_snapshot TEXT NOT NULL DEFAULT '{}',
    files INTEGER NOT NULL DEFAULT 0,
    pages INTEGER NOT NULL DEFAULT 0,
    tickets_created INTEGER NOT NULL DEFAULT 0,
    tickets_updated INTEGER NOT NULL DEFAULT 0,
    duplicates_found INTEGER NOT NULL DEFAULT 0,
    review_queue_count INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0
)"#,
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend("sqlite", "CREATE INDEX idx_processing_runs_status ON processing_runs(status)")
                .for_backend("postgres", "CREATE INDEX idx_processing_runs_status ON processing_runs(status)"),
        )
}
