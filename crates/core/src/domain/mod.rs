// Domain Layer - Pure package-action model, no OS access

pub mod error;
pub mod lock_policy;
pub mod os_family;
pub mod pattern;
pub mod resource;

// Re-exports
pub use error::DomainError;
pub use lock_policy::LockDetectionPolicy;
pub use os_family::OsFamily;
pub use pattern::PackagePattern;
pub use resource::{
    LogOutput, PackageAction, PackageResource, RepoSelection, RetrySettings,
    DEFAULT_LOCKED_TRIES, DEFAULT_LOCKED_TRY_SLEEP_SECS,
};
