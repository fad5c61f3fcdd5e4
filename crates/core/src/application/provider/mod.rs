// Package Providers - one variant per package-manager family

mod apt;
mod yum;
mod zypper;

pub use apt::AptProvider;
pub use yum::YumProvider;
pub use zypper::ZypperProvider;

use crate::application::presence::PresenceOracle;
use crate::application::retry::LockAwareExecutor;
use crate::domain::{LockDetectionPolicy, LogOutput, OsFamily, RepoSelection};
use crate::error::{PackageError, Result};
use crate::port::{ActionLogger, CommandSpec, ExecutionResult, LogLevel};
use async_trait::async_trait;
use std::sync::Arc;

/// What a provider operation ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The package manager ran; last command's result
    Executed(ExecutionResult),
    /// Nothing to do (already installed, or already absent)
    Skipped { reason: String },
}

impl ActionOutcome {
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            ActionOutcome::Executed(result) => Some(result),
            ActionOutcome::Skipped { .. } => None,
        }
    }
}

/// Whether command output should be streamed to the log
///
/// Enabled streams when info is on; Inherit streams only when debug is on.
pub fn should_log_output(logoutput: LogOutput, logger: &dyn ActionLogger) -> bool {
    match logoutput {
        LogOutput::Enabled => logger.is_enabled(LogLevel::Info),
        LogOutput::Inherit => logger.is_enabled(LogLevel::Debug),
        LogOutput::Disabled => false,
    }
}

/// Per-action state handed to provider operations
pub struct ActionContext {
    runner: LockAwareExecutor,
    logoutput: bool,
}

impl ActionContext {
    pub fn new(runner: LockAwareExecutor, logoutput: bool) -> Self {
        Self { runner, logoutput }
    }

    pub fn runner(&self) -> &LockAwareExecutor {
        &self.runner
    }

    pub fn logger(&self) -> &dyn ActionLogger {
        self.runner.logger().as_ref()
    }

    pub fn logoutput(&self) -> bool {
        self.logoutput
    }

    /// Privileged command with this action's output streaming applied
    pub fn command(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program)
            .logoutput(self.logoutput)
            .privileged()
    }
}

/// Package Provider capability contract
///
/// Variants override the operations their package manager supports; the
/// defaults report [`PackageError::UnsupportedOperation`].
#[async_trait]
pub trait PackageProvider: Send + Sync {
    /// Provider name, for logs and errors
    fn name(&self) -> &'static str;

    /// Lock-wait signatures of this package manager
    fn lock_policy(&self) -> Arc<LockDetectionPolicy>;

    async fn install_package(
        &self,
        _ctx: &ActionContext,
        _name: &str,
        _repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        Err(PackageError::UnsupportedOperation {
            operation: "install",
            provider: self.name(),
        })
    }

    async fn remove_package(&self, _ctx: &ActionContext, _name: &str) -> Result<ActionOutcome> {
        Err(PackageError::UnsupportedOperation {
            operation: "remove",
            provider: self.name(),
        })
    }

    async fn upgrade_package(
        &self,
        _ctx: &ActionContext,
        _name: &str,
        _repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        Err(PackageError::UnsupportedOperation {
            operation: "upgrade",
            provider: self.name(),
        })
    }
}

/// Pick the provider variant for a host's OS family
///
/// `policy` replaces the family's built-in lock signatures when given.
pub fn provider_for(
    family: OsFamily,
    oracle: Arc<PresenceOracle>,
    policy: Option<LockDetectionPolicy>,
) -> Arc<dyn PackageProvider> {
    let policy = Arc::new(policy.unwrap_or_else(|| LockDetectionPolicy::for_family(family)));
    match family {
        OsFamily::Debian => Arc::new(AptProvider::new(oracle, policy)),
        OsFamily::RedHat => Arc::new(YumProvider::new(oracle, policy)),
        OsFamily::Suse => Arc::new(ZypperProvider::new(oracle, policy)),
    }
}

/// Skip an install when the oracle already sees the package
pub(crate) async fn skip_if_installed(
    oracle: &PresenceOracle,
    ctx: &ActionContext,
    name: &str,
) -> Result<Option<ActionOutcome>> {
    if oracle.is_installed(name).await? {
        let reason = format!("Skipping installation of existing package {}", name);
        ctx.logger().info(&reason);
        return Ok(Some(ActionOutcome::Skipped { reason }));
    }
    Ok(None)
}

/// Skip a removal when the oracle does not see the package
pub(crate) async fn skip_if_absent(
    oracle: &PresenceOracle,
    ctx: &ActionContext,
    name: &str,
) -> Result<Option<ActionOutcome>> {
    if !oracle.is_installed(name).await? {
        let reason = format!("Skipping removal of non-existing package {}", name);
        ctx.logger().info(&reason);
        return Ok(Some(ActionOutcome::Skipped { reason }));
    }
    Ok(None)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::port::action_logger::mocks::RecordingLogger;

    struct InstallOnlyProvider;

    #[async_trait]
    impl PackageProvider for InstallOnlyProvider {
        fn name(&self) -> &'static str {
            "install-only"
        }

        fn lock_policy(&self) -> Arc<LockDetectionPolicy> {
            Arc::new(LockDetectionPolicy::default())
        }

        async fn install_package(
            &self,
            ctx: &ActionContext,
            name: &str,
            _repos: &RepoSelection,
        ) -> Result<ActionOutcome> {
            let result = ctx
                .runner()
                .checked_call_until_not_locked(&ctx.command("/bin/installer").arg(name))
                .await?;
            Ok(ActionOutcome::Executed(result))
        }
    }

    #[test]
    fn test_should_log_output_matrix() {
        let info = RecordingLogger::new(LogLevel::Info);
        let debug = RecordingLogger::new(LogLevel::Debug);
        let silent = RecordingLogger::silent();

        assert!(should_log_output(LogOutput::Enabled, &info));
        assert!(should_log_output(LogOutput::Enabled, &debug));
        assert!(!should_log_output(LogOutput::Enabled, &silent));

        assert!(!should_log_output(LogOutput::Inherit, &info));
        assert!(should_log_output(LogOutput::Inherit, &debug));

        assert!(!should_log_output(LogOutput::Disabled, &debug));
    }

    #[tokio::test]
    async fn test_unimplemented_operations_are_unsupported() {
        let h = ProviderHarness::new();
        let provider = InstallOnlyProvider;
        let ctx = h.context(provider.lock_policy(), false);

        let installed = provider
            .install_package(&ctx, "hadoop", &RepoSelection::default())
            .await
            .unwrap();
        assert!(installed.result().is_some());

        let err = provider.remove_package(&ctx, "hadoop").await.unwrap_err();
        assert!(matches!(
            err,
            PackageError::UnsupportedOperation {
                operation: "remove",
                provider: "install-only"
            }
        ));

        let err = provider
            .upgrade_package(&ctx, "hadoop", &RepoSelection::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PackageError::UnsupportedOperation {
                operation: "upgrade",
                ..
            }
        ));
        assert_eq!(h.executor.call_count(), 1);
    }

    #[test]
    fn test_provider_for_family() {
        let oracle = oracle(&[]);
        assert_eq!(provider_for(OsFamily::Debian, oracle.clone(), None).name(), "apt");
        assert_eq!(provider_for(OsFamily::RedHat, oracle.clone(), None).name(), "yum");
        assert_eq!(provider_for(OsFamily::Suse, oracle, None).name(), "zypper");
    }

    #[test]
    fn test_provider_for_custom_policy() {
        let policy = LockDetectionPolicy::from_substrings(["custom lock banner"]);
        let provider = provider_for(OsFamily::RedHat, oracle(&[]), Some(policy));
        assert!(provider.lock_policy().is_locked_output("a custom lock banner"));
        assert!(!provider.lock_policy().is_locked_output("Existing lock /var/run/yum.pid"));
    }

    #[test]
    fn test_context_command_carries_logoutput() {
        let h = ProviderHarness::new();
        let ctx = h.context(Arc::new(LockDetectionPolicy::default()), true);
        let cmd = ctx.command("/usr/bin/yum");
        assert!(cmd.logs_output());
        assert!(cmd.is_privileged());
    }
}
