//! Unified database connection pool supporting SQLite and PostgreSQL.
//!
//! Grounded on `repository/pool.rs`: the backend is selected at runtime from
//! the database URL, and callers write one code path against `DbPool`
//! dispatched through the [`with_conn!`] macro.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;

#[cfg(feature = "postgres")]
use diesel_async::pooled_connection::deadpool::Pool as DeadPool;
#[cfg(feature = "postgres")]
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
#[cfg(feature = "postgres")]
use diesel_async::AsyncPgConnection;

use super::util::to_diesel_error;

pub type DbError = diesel::result::Error;
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

#[cfg(feature = "postgres")]
pub type PgConn = deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// SQLite connection "pool" — lightweight, establishes a connection on
/// demand since `SyncConnectionWrapper` doesn't itself pool.
#[derive(Clone)]
pub struct SqlitePool {
    database_url: String,
}

impl SqlitePool {
    pub fn new(database_url: &str) -> Self {
        let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        Self { database_url: url.to_string() }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.display().to_string())
    }

    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        SqliteConn::establish(&self.database_url).await.map_err(to_diesel_error)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

#[cfg(feature = "postgres")]
#[derive(Clone)]
pub struct PgPool {
    pool: DeadPool<AsyncPgConnection>,
}

#[cfg(feature = "postgres")]
impl PgPool {
    pub fn new(database_url: &str, max_size: usize) -> Result<Self, DbError> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = DeadPool::builder(config).max_size(max_size).build().map_err(to_diesel_error)?;
        Ok(Self { pool })
    }

    pub async fn get(&self) -> Result<PgConn, DbError> {
        self.pool.get().await.map_err(to_diesel_error)
    }
}

/// Unified database pool that supports both SQLite and PostgreSQL.
#[derive(Clone)]
pub enum DbPool {
    Sqlite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

impl DbPool {
    /// Detects the backend from the URL scheme: `postgres://`/`postgresql://`
    /// selects PostgreSQL, everything else is treated as a SQLite path.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        #[cfg(feature = "postgres")]
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(DbPool::Postgres(PgPool::new(url, 10)?));
        }
        Ok(DbPool::Sqlite(SqlitePool::new(url)))
    }

    pub fn sqlite_from_path(path: &Path) -> Self {
        DbPool::Sqlite(SqlitePool::from_path(path))
    }

    pub fn is_sqlite(&self) -> bool {
        matches!(self, DbPool::Sqlite(_))
    }

    #[cfg(feature = "postgres")]
    pub fn is_postgres(&self) -> bool {
        matches!(self, DbPool::Postgres(_))
    }
}

/// Run database operations on whichever backend `DbPool` holds.
///
/// ```ignore
/// with_conn!(self.pool, conn => {
///     truck_tickets::table.load::<TruckTicketRow>(&mut conn).await
/// })
/// ```
#[macro_export]
macro_rules! with_conn {
    ($pool:expr, $conn:ident => $body:expr) => {{
        match &$pool {
            $crate::repository::pool::DbPool::Sqlite(pool) => {
                let mut $conn = pool.get().await?;
                $body
            }
            #[cfg(feature = "postgres")]
            $crate::repository::pool::DbPool::Postgres(pool) => {
                let mut $conn = pool.get().await?;
                $body
            }
        }
    }};
}

#[allow(unused_imports)]
pub use with_conn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_scheme_is_sqlite() {
        assert!(DbPool::from_url("/path/to/db.sqlite").unwrap().is_sqlite());
        assert!(DbPool::from_url("sqlite:/path/to/db").unwrap().is_sqlite());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_scheme_selects_postgres_backend() {
        assert!(DbPool::from_url("postgres://localhost/test").unwrap().is_postgres());
        assert!(DbPool::from_url("postgresql://localhost/test").unwrap().is_postgres());
    }
}
