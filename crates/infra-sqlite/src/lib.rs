// pkgagent Infrastructure - SQLite Adapter
// Implements: PackageDatabase over the RPM sqlite backend

mod connection;
mod rpm_database;

pub use connection::open_read_only;
pub use rpm_database::{RpmSqliteDatabase, RPMDB_SQLITE_PATH};

// Note: sqlx::Error is mapped to DatabaseError in helper functions;
// orphan rules forbid From<sqlx::Error> for a core type here
