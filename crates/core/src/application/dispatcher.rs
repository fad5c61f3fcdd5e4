// Action dispatcher - turns a PackageResource into one provider call
use crate::application::provider::{
    should_log_output, ActionContext, ActionOutcome, PackageProvider,
};
use crate::application::retry::LockAwareExecutor;
use crate::domain::{PackageAction, PackageResource};
use crate::error::Result;
use crate::port::{ActionLogger, CommandExecutor, Sleeper};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs desired-state requests against the host's package provider
///
/// Requests are handled one at a time, start to finish; callers serialize
/// package actions against a node.
pub struct PackageDispatcher {
    provider: Arc<dyn PackageProvider>,
    executor: Arc<dyn CommandExecutor>,
    sleeper: Arc<dyn Sleeper>,
    logger: Arc<dyn ActionLogger>,
}

impl PackageDispatcher {
    pub fn new(
        provider: Arc<dyn PackageProvider>,
        executor: Arc<dyn CommandExecutor>,
        sleeper: Arc<dyn Sleeper>,
        logger: Arc<dyn ActionLogger>,
    ) -> Self {
        Self {
            provider,
            executor,
            sleeper,
            logger,
        }
    }

    pub fn provider(&self) -> &dyn PackageProvider {
        self.provider.as_ref()
    }

    /// Apply one resource
    ///
    /// The resource is consumed; its retry settings apply to every command
    /// this action issues.
    pub async fn dispatch(&self, resource: PackageResource) -> Result<ActionOutcome> {
        let runner = LockAwareExecutor::new(
            self.executor.clone(),
            self.sleeper.clone(),
            self.logger.clone(),
            self.provider.lock_policy(),
            resource.retry(),
        );
        let logoutput = should_log_output(resource.logoutput(), self.logger.as_ref());
        let ctx = ActionContext::new(runner, logoutput);

        let identifier = resource.resolved_identifier();
        let repos = resource.repos();

        info!(
            action = %resource.action(),
            package = %identifier,
            provider = self.provider.name(),
            locked_tries = resource.retry().locked_tries,
            "Applying package action"
        );

        let outcome = match resource.action() {
            PackageAction::Install => {
                self.provider
                    .install_package(&ctx, &identifier, repos)
                    .await
            }
            PackageAction::Upgrade => {
                self.provider
                    .upgrade_package(&ctx, &identifier, repos)
                    .await
            }
            PackageAction::Remove => self.provider.remove_package(&ctx, &identifier).await,
        };

        match &outcome {
            Ok(ActionOutcome::Executed(result)) => info!(
                package = %identifier,
                exit_code = result.exit_code,
                "Package action completed"
            ),
            Ok(ActionOutcome::Skipped { reason }) => info!(
                package = %identifier,
                reason = %reason,
                "Package action skipped"
            ),
            Err(e) => warn!(package = %identifier, error = %e, "Package action failed"),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::presence::PresenceOracle;
    use crate::application::provider::provider_for;
    use crate::domain::{LogOutput, OsFamily, RepoSelection, RetrySettings};
    use crate::error::PackageError;
    use crate::port::action_logger::mocks::RecordingLogger;
    use crate::port::command_executor::mocks::ScriptedExecutor;
    use crate::port::sleeper::mocks::RecordingSleeper;
    use crate::port::{InMemoryPackageDatabase, LogLevel};
    use std::time::Duration;

    struct Fixture {
        executor: ScriptedExecutor,
        sleeper: RecordingSleeper,
        logger: RecordingLogger,
        dispatcher: PackageDispatcher,
    }

    fn fixture(family: OsFamily, installed: &[&str], threshold: LogLevel) -> Fixture {
        let executor = ScriptedExecutor::new();
        let sleeper = RecordingSleeper::new();
        let logger = RecordingLogger::new(threshold);
        let oracle = Arc::new(PresenceOracle::new(Arc::new(InMemoryPackageDatabase::new(
            installed.iter().copied(),
        ))));

        let dispatcher = PackageDispatcher::new(
            provider_for(family, oracle, None),
            Arc::new(executor.clone()),
            Arc::new(sleeper.clone()),
            Arc::new(logger.clone()),
        );

        Fixture {
            executor,
            sleeper,
            logger,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_dispatch_install_uses_versioned_identifier() {
        let f = fixture(OsFamily::RedHat, &[], LogLevel::Info);
        let resource = PackageResource::new("hadoop", PackageAction::Install)
            .version("2.6.0")
            .with_repos(RepoSelection::new(["HDP"], Vec::<String>::new()))
            .build()
            .unwrap();

        let outcome = f.dispatcher.dispatch(resource).await.unwrap();

        assert!(matches!(outcome, ActionOutcome::Executed(_)));
        let lines = f.executor.command_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("--enablerepo=HDP hadoop-2.6.0"));
    }

    #[tokio::test]
    async fn test_dispatch_remove_without_version() {
        let f = fixture(OsFamily::Debian, &["zookeeper"], LogLevel::Info);
        let resource = PackageResource::new("zookeeper", PackageAction::Remove)
            .build()
            .unwrap();

        f.dispatcher.dispatch(resource).await.unwrap();

        assert_eq!(
            f.executor.command_lines(),
            vec!["/usr/bin/apt-get -y -q remove zookeeper".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dispatch_upgrade() {
        let f = fixture(OsFamily::Suse, &[], LogLevel::Info);
        let resource = PackageResource::new("zookeeper", PackageAction::Upgrade)
            .build()
            .unwrap();

        f.dispatcher.dispatch(resource).await.unwrap();

        assert!(f.executor.command_lines()[0].contains(" update "));
    }

    #[tokio::test]
    async fn test_dispatch_applies_resource_retry_settings() {
        let f = fixture(OsFamily::RedHat, &[], LogLevel::Info);
        for _ in 0..2 {
            f.executor
                .push_result(1, "Existing lock /var/run/yum.pid: another copy is running");
        }
        let resource = PackageResource::new("hadoop", PackageAction::Install)
            .with_retry(RetrySettings::new(2, Duration::from_secs(4)).unwrap())
            .build()
            .unwrap();

        let err = f.dispatcher.dispatch(resource).await.unwrap_err();

        assert!(matches!(err, PackageError::CommandFailure { attempts: 2, .. }));
        assert_eq!(f.sleeper.sleeps(), vec![Duration::from_secs(4)]);
        assert_eq!(
            f.logger
                .info_lines()
                .iter()
                .filter(|l| l.starts_with("Package manager lock is acquired. Retrying after 4 seconds."))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_dispatch_logoutput_inherit_follows_debug_level() {
        let quiet = fixture(OsFamily::RedHat, &[], LogLevel::Info);
        let verbose = fixture(OsFamily::RedHat, &[], LogLevel::Debug);

        for f in [&quiet, &verbose] {
            let resource = PackageResource::new("hadoop", PackageAction::Upgrade)
                .with_logoutput(LogOutput::Inherit)
                .build()
                .unwrap();
            f.dispatcher.dispatch(resource).await.unwrap();
        }

        assert!(!quiet.executor.calls()[0].logs_output());
        assert!(verbose.executor.calls()[0].logs_output());
    }

    #[tokio::test]
    async fn test_dispatch_skips_installed_package() {
        let f = fixture(OsFamily::RedHat, &["hadoop-2.6.0"], LogLevel::Info);
        let resource = PackageResource::new("hadoop", PackageAction::Install)
            .version("2.6.0")
            .build()
            .unwrap();

        let outcome = f.dispatcher.dispatch(resource).await.unwrap();

        assert!(matches!(outcome, ActionOutcome::Skipped { .. }));
        assert_eq!(f.executor.call_count(), 0);
    }
}
