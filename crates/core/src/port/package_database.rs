// Package Database Port
// Read-only view of the host's installed-package database

use async_trait::async_trait;
use thiserror::Error;

/// Errors opening or reading a package database
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Package database {location} is unavailable: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("Package database {location} could not be read: {reason}")]
    Read { location: String, reason: String },
}

/// Package Database trait
///
/// Implementations:
/// - DpkgStatusDatabase (infra-system): parses the dpkg status file in-process
/// - RpmSqliteDatabase (infra-sqlite): queries rpmdb.sqlite in-process
/// - CommandLineDatabase (infra-system): asks dpkg-query / rpm, output discarded
/// - InMemoryPackageDatabase: fixed list, for tests and dry runs
#[async_trait]
pub trait PackageDatabase: Send + Sync {
    /// Short name of the lookup strategy, for logs
    fn strategy(&self) -> &'static str;

    /// Names of all installed packages
    ///
    /// # Errors
    /// - DatabaseError::Unavailable if the database cannot be opened
    async fn installed_names(&self) -> Result<Vec<String>, DatabaseError>;
}

/// Package database held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPackageDatabase {
    names: Vec<String>,
}

impl InMemoryPackageDatabase {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl PackageDatabase for InMemoryPackageDatabase {
    fn strategy(&self) -> &'static str {
        "in-memory"
    }

    async fn installed_names(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.names.clone())
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Database that cannot be opened
    pub struct UnavailableDatabase {
        pub reason: String,
    }

    impl UnavailableDatabase {
        pub fn new(reason: impl Into<String>) -> Self {
            Self {
                reason: reason.into(),
            }
        }
    }

    #[async_trait]
    impl PackageDatabase for UnavailableDatabase {
        fn strategy(&self) -> &'static str {
            "unavailable"
        }

        async fn installed_names(&self) -> Result<Vec<String>, DatabaseError> {
            Err(DatabaseError::Unavailable {
                location: "mock".to_string(),
                reason: self.reason.clone(),
            })
        }
    }
}
