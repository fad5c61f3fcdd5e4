// RPM package database over rpmdb.sqlite

use crate::connection::open_read_only;
use async_trait::async_trait;
use pkgagent_core::port::{DatabaseError, PackageDatabase};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::debug;

/// Default location of the sqlite rpm backend
pub const RPMDB_SQLITE_PATH: &str = "/var/lib/rpm/rpmdb.sqlite";

/// The `Name` index table holds one row per installed header
const INSTALLED_NAMES: &str = "SELECT key FROM Name";

/// Reads installed package names straight from rpmdb.sqlite
///
/// The pool is opened on first use and kept for the life of the value.
pub struct RpmSqliteDatabase {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl RpmSqliteDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn pool(&self) -> Result<&SqlitePool, DatabaseError> {
        self.pool
            .get_or_try_init(|| open_read_only(&self.path))
            .await
            .map_err(|e| DatabaseError::Unavailable {
                location: self.location(),
                reason: e.to_string(),
            })
    }
}

impl Default for RpmSqliteDatabase {
    fn default() -> Self {
        Self::new(RPMDB_SQLITE_PATH)
    }
}

// Helper to convert a query-time sqlx::Error into a DatabaseError
fn map_sqlx_error(err: sqlx::Error, location: String) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // SQLITE_BUSY / SQLITE_LOCKED
            Some("5") | Some("6") => DatabaseError::Unavailable {
                location,
                reason: format!("Database is locked: {}", db_err.message()),
            },
            _ => DatabaseError::Read {
                location,
                reason: db_err.message().to_string(),
            },
        },
        _ => DatabaseError::Read {
            location,
            reason: err.to_string(),
        },
    }
}

#[async_trait]
impl PackageDatabase for RpmSqliteDatabase {
    fn strategy(&self) -> &'static str {
        "rpmdb-sqlite"
    }

    async fn installed_names(&self) -> Result<Vec<String>, DatabaseError> {
        let pool = self.pool().await?;

        let names: Vec<String> = sqlx::query_scalar(INSTALLED_NAMES)
            .fetch_all(pool)
            .await
            .map_err(|e| map_sqlx_error(e, self.location()))?;

        debug!(path = %self.path.display(), count = names.len(), "Read rpmdb.sqlite");
        Ok(names)
    }
}
