// Port Layer - Interfaces for external dependencies

pub mod action_logger;
pub mod command_executor;
pub mod package_database;
pub mod sleeper;

// Re-exports
pub use action_logger::{ActionLogger, LogLevel, TracingActionLogger};
pub use command_executor::{
    CommandExecutor, CommandSpec, ExecutionError, ExecutionMode, ExecutionResult,
};
pub use package_database::{DatabaseError, InMemoryPackageDatabase, PackageDatabase};
pub use sleeper::{Sleeper, TokioSleeper};
