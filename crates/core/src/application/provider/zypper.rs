// zypper provider (SUSE family)

use super::{skip_if_absent, skip_if_installed, ActionContext, ActionOutcome, PackageProvider};
use crate::application::presence::PresenceOracle;
use crate::domain::{LockDetectionPolicy, RepoSelection};
use crate::error::Result;
use crate::port::CommandSpec;
use async_trait::async_trait;
use std::sync::Arc;

const ZYPPER: &str = "/usr/bin/zypper";

pub struct ZypperProvider {
    oracle: Arc<PresenceOracle>,
    policy: Arc<LockDetectionPolicy>,
}

impl ZypperProvider {
    pub fn new(oracle: Arc<PresenceOracle>, policy: Arc<LockDetectionPolicy>) -> Self {
        Self { oracle, policy }
    }

    fn base_command(ctx: &ActionContext, verb: &str) -> CommandSpec {
        let cmd = ctx.command(ZYPPER);
        let cmd = if ctx.logoutput() {
            cmd
        } else {
            cmd.arg("--quiet")
        };
        cmd.arg(verb)
    }

    fn with_repos(ctx: &ActionContext, cmd: CommandSpec, repos: &RepoSelection) -> CommandSpec {
        if !repos.skip_repos.is_empty() {
            ctx.logger().debug(&format!(
                "zypper cannot skip repositories; ignoring skip_repos={:?}",
                repos.skip_repos
            ));
        }
        repos
            .use_repos
            .iter()
            .fold(cmd, |cmd, repo| cmd.args(["--repo", repo.as_str()]))
    }
}

#[async_trait]
impl PackageProvider for ZypperProvider {
    fn name(&self) -> &'static str {
        "zypper"
    }

    fn lock_policy(&self) -> Arc<LockDetectionPolicy> {
        self.policy.clone()
    }

    async fn install_package(
        &self,
        ctx: &ActionContext,
        name: &str,
        repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        if let Some(skipped) = skip_if_installed(&self.oracle, ctx, name).await? {
            return Ok(skipped);
        }
        ctx.logger().info(&format!("Installing package {} ('{}')", name, ZYPPER));
        let cmd = Self::base_command(ctx, "install")
            .args(["--auto-agree-with-licenses", "--no-confirm"]);
        let cmd = Self::with_repos(ctx, cmd, repos).arg(name);
        let result = ctx.runner().checked_call_until_not_locked(&cmd).await?;
        Ok(ActionOutcome::Executed(result))
    }

    async fn remove_package(&self, ctx: &ActionContext, name: &str) -> Result<ActionOutcome> {
        if let Some(skipped) = skip_if_absent(&self.oracle, ctx, name).await? {
            return Ok(skipped);
        }
        ctx.logger().info(&format!("Removing package {} ('{}')", name, ZYPPER));
        let cmd = Self::base_command(ctx, "remove").arg("--no-confirm").arg(name);
        let result = ctx.runner().checked_call_until_not_locked(&cmd).await?;
        Ok(ActionOutcome::Executed(result))
    }

    async fn upgrade_package(
        &self,
        ctx: &ActionContext,
        name: &str,
        repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        ctx.logger().info(&format!("Upgrading package {} ('{}')", name, ZYPPER));
        let cmd = Self::base_command(ctx, "update")
            .args(["--auto-agree-with-licenses", "--no-confirm"]);
        let cmd = Self::with_repos(ctx, cmd, repos).arg(name);
        let result = ctx.runner().checked_call_until_not_locked(&cmd).await?;
        Ok(ActionOutcome::Executed(result))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::OsFamily;

    fn provider(installed: &[&str]) -> ZypperProvider {
        ZypperProvider::new(
            oracle(installed),
            Arc::new(LockDetectionPolicy::for_family(OsFamily::Suse)),
        )
    }

    #[tokio::test]
    async fn test_install_with_repos() {
        let h = ProviderHarness::new();
        let provider = provider(&[]);
        let ctx = h.context(provider.lock_policy(), false);

        provider
            .install_package(&ctx, "hadoop", &RepoSelection::new(["HDP", "HDP-UTILS"], ["base"]))
            .await
            .unwrap();

        assert_eq!(
            h.executor.command_lines(),
            vec![
                "/usr/bin/zypper --quiet install --auto-agree-with-licenses --no-confirm --repo HDP --repo HDP-UTILS hadoop"
                    .to_string()
            ]
        );
        assert_eq!(
            h.logger.debug_lines(),
            vec!["zypper cannot skip repositories; ignoring skip_repos={\"base\"}".to_string()]
        );
    }

    #[tokio::test]
    async fn test_zypper_lock_exhaustion_reports_last_output() {
        let h = ProviderHarness::new();
        for pid in [100, 101, 102] {
            h.executor.push_result(
                7,
                &format!("System management is locked by the application with pid {} (zypper).", pid),
            );
        }
        let provider = provider(&[]);
        let ctx = h.context(provider.lock_policy(), false);

        let err = provider
            .install_package(&ctx, "hadoop", &RepoSelection::default())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), Some(7));
        assert!(err.output().unwrap().contains("pid 102"));
        assert_eq!(h.executor.call_count(), 3);
        assert_eq!(h.sleeper.count(), 2);
    }

    #[tokio::test]
    async fn test_remove_and_upgrade() {
        let h = ProviderHarness::new();
        let provider = provider(&["hadoop"]);
        let ctx = h.context(provider.lock_policy(), true);

        provider.remove_package(&ctx, "hadoop").await.unwrap();
        provider
            .upgrade_package(&ctx, "hadoop", &RepoSelection::default())
            .await
            .unwrap();

        assert_eq!(
            h.executor.command_lines(),
            vec![
                "/usr/bin/zypper remove --no-confirm hadoop".to_string(),
                "/usr/bin/zypper update --auto-agree-with-licenses --no-confirm hadoop".to_string(),
            ]
        );
    }
}
