// Package presence oracle
use crate::domain::PackagePattern;
use crate::error::{PackageError, Result};
use crate::port::PackageDatabase;
use std::sync::Arc;
use tracing::debug;

/// Answers "is a package matching this name installed?"
///
/// Reads the package database through whatever strategy was resolved at
/// startup; never mutates it. An unreadable database is an error, not "absent".
pub struct PresenceOracle {
    database: Arc<dyn PackageDatabase>,
}

impl PresenceOracle {
    pub fn new(database: Arc<dyn PackageDatabase>) -> Self {
        Self { database }
    }

    pub fn strategy(&self) -> &'static str {
        self.database.strategy()
    }

    /// Check whether a package matching `name` is present
    ///
    /// `name` may carry `?` and `*` globs; everything else is literal.
    ///
    /// # Errors
    /// - PackageError::PresenceCheckFailure if the database cannot be read
    pub async fn is_installed(&self, name: &str) -> Result<bool> {
        let pattern = PackagePattern::new(name)?;
        let names = self
            .database
            .installed_names()
            .await
            .map_err(PackageError::from)?;

        let found = names.iter().find(|candidate| pattern.matches(candidate));

        debug!(
            pattern = %pattern.as_str(),
            strategy = self.database.strategy(),
            scanned = names.len(),
            matched = ?found,
            "Package presence check"
        );

        Ok(found.is_some())
    }
}
