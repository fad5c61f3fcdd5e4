// Application Layer - Package actions and their retry policy

pub mod dispatcher;
pub mod presence;
pub mod provider;
pub mod retry;

// Re-exports
pub use dispatcher::PackageDispatcher;
pub use presence::PresenceOracle;
pub use provider::{
    provider_for, should_log_output, ActionContext, ActionOutcome, PackageProvider,
};
pub use retry::LockAwareExecutor;
