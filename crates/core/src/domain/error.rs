// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Package name must not be empty")]
    EmptyPackageName,

    #[error("Package version must not be empty when given")]
    EmptyVersion,

    #[error("locked_tries must be at least 1 (got {0})")]
    InvalidLockedTries(u32),

    #[error("Unknown package action: {0}")]
    UnknownAction(String),

    #[error("Unknown OS family: {0}")]
    UnknownOsFamily(String),

    #[error("Invalid lock pattern '{pattern}': {reason}")]
    InvalidLockPattern { pattern: String, reason: String },

    #[error("Invalid package pattern '{pattern}': {reason}")]
    InvalidPackagePattern { pattern: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
