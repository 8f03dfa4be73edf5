use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0003_review_queue")
        .depends_on(&["0002_truck_tickets"])
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    r#"CREATE TABLE review_queue_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id INTEGER REFERENCES truck_tickets(id),
    file_id TEXT NOT NULL,
    file_page INTEGER NOT NULL,
    reason TEXT NOT NULL,
    severity TEXT NOT NULL,
    file_path TEXT NOT NULL,
    page_num INTEGER NOT NULL,
    detected_fields TEXT NOT NULL DEFAULT '{}',
    suggested_fixes TEXT NOT NULL DEFAULT '{}',
    resolved INTEGER NOT NULL DEFAULT 0,
    resolved_by TEXT,
    resolved_at TEXT,
    created_at TEXT NOT NULL
)"#,
                )
                .for_backend(
                    "postgres",
                    r#"CREATE TABLE IF NOT EXISTS review_queue_entries (
    id SERIAL PRIMARY KEY,
    ticket_id INTEGER REFERENCES truck_tickets(id),
    file_id TEXT NOT NULL,
    file_page INTEGER NOT NULL,
    reason TEXT NOT NULL,
    severity TEXT NOT NULL,
    file_path TEXT NOT NULL,
    page_num INTEGER NOT NULL,
    detected_fields TEXT NOT NULL DEFAULT '{}',
    suggested_fixes TEXT NOT NULL DEFAULT '{}',
    resolved INTEGER NOT NULL DEFAULT 0,
    resolved_by TEXT,
    resolved_at TEXT,
    created_at TEXT NOT NULL
)"#,
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    "CREATE INDEX idx_review_queue_page ON review_queue_entries(file_id, file_page)",
                )
                .for_backend(
                    "postgres",
                    "CREATE INDEX idx_review_queue_page ON review_queue_entries(file_id, file_page)",
                ),
        )
        .operation(
            RunSql::portable()
                .for_backend(
                    "sqlite",
                    "CREATE INDEX idx_review_queue_unresolved ON review_queue_entries(resolved, severity)",
                )
                .for_backend(
                    "postgres",
                    "CREATE INDEX idx_review_queue_unresolved ON review_queue_entries(resolved, severity)",
                ),
        )
}
