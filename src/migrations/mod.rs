//! Code-defined, dual-backend schema migrations (`cetane`), grounded on
//! `migrations/mod.rs` + `migrations/m0002_service_status.rs` /
//! `m0004_unique_constraints.rs`.

mod m0001_reference_tables;
mod m0002_truck_tickets;
mod m0003_review_queue;
mod m0004_processing_runs;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_reference_tables::migration());
    reg.register(m0002_truck_tickets::migration());
    reg.register(m0003_review_queue::migration());
    reg.register(m0004_processing_runs::migration());
    reg
}

/// Apply every migration in dependency order to a SQLite database at
/// `database_url` (a plain file path or `sqlite:`-prefixed path).
///
/// Uses `rusqlite` directly rather than `diesel_migrations`, mirroring the
/// harness in `tests/migration_parity.rs`: `cetane` only generates SQL
/// strings, something has to execute them.
pub fn run_sqlite_migrations(database_url: &str) -> Result<(), crate::error::TicketError> {
    use cetane::backend::Sqlite;

    let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
    let conn = rusqlite::Connection::open(path)
        .map_err(|e| crate::error::TicketError::Processing(format!("opening database: {e}")))?;

    let registry = registry();
    let backend = Sqlite;
    let ordered = registry
        .resolve_order()
        .map_err(|e| crate::error::TicketError::Processing(format!("resolving migration order: {e}")))?;

    for name in ordered {
        let migration = registry
            .get(name)
            .expect("migration present in registry after resolve_order");
        for statement in migration.forward_sql(&backend) {
            if statement.trim().is_empty() {
                continue;
            }
            conn.execute_batch(&statement)
                .map_err(|e| crate::error::TicketError::Processing(format!("migration {name}: {e}")))?;
        }
        tracing::info!(migration = name, "applied migration");
    }
    Ok(())
}

/// Run migrations against `database_url`, dispatching to the SQLite or
/// PostgreSQL executor based on the URL scheme.
pub async fn run_migrations(database_url: &str) -> Result<(), crate::error::TicketError> {
    if crate::repository::util::is_postgres_url(database_url) {
        #[cfg(feature = "postgres")]
        {
            run_postgres_migrations(database_url).await
        }
        #[cfg(not(feature = "postgres"))]
        {
            Err(crate::error::TicketError::Processing(
                "PostgreSQL URL provided but this binary was compiled without PostgreSQL support \
                 (rebuild with --features postgres)"
                    .to_string(),
            ))
        }
    } else {
        let url = database_url.to_string();
        tokio::task::spawn_blocking(move || run_sqlite_migrations(&url))
            .await
            .map_err(|e| crate::error::TicketError::Processing(format!("migration task panicked: {e}")))?
    }
}

#[cfg(feature = "postgres")]
async fn run_postgres_migrations(database_url: &str) -> Result<(), crate::error::TicketError> {
    use cetane::backend::Postgres;

    let (client, connection) = tokio_postgres::connect(database_url, tokio_postgres::NoTls)
        .await
        .map_err(|e| crate::error::TicketError::Processing(format!("connecting to postgres: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(error = %e, "postgres migration connection closed with error");
        }
    });

    let registry = registry();
    let backend = Postgres;
    let ordered = registry
        .resolve_order()
        .map_err(|e| crate::error::TicketError::Processing(format!("resolving migration order: {e}")))?;

    for name in ordered {
        let migration = registry
            .get(name)
            .expect("migration present in registry after resolve_order");
        for statement in migration.forward_sql(&backend) {
            if statement.trim().is_empty() {
                continue;
            }
            client
                .batch_execute(&statement)
                .await
                .map_err(|e| crate::error::TicketError::Processing(format!("migration {name}: {e}")))?;
        }
        tracing::info!(migration = name, "applied migration");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_without_cycles() {
        let reg = registry();
        let ordered = reg.resolve_order().expect("migrations must form a DAG");
        assert_eq!(ordered.len(), 4);
    }

    #[test]
    fn sqlite_migrations_apply_cleanly_to_a_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite");
        run_sqlite_migrations(path.to_str().unwrap()).expect("migrations should apply");

        let conn = rusqlite::Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 9);
    }
}
