// pkgagent Core - Package actions, lock-aware retries & ports
// NO process spawning or database drivers here; adapters live in infra crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{PackageError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
