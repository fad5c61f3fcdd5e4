// yum provider (RedHat family)

use super::{skip_if_absent, skip_if_installed, ActionContext, ActionOutcome, PackageProvider};
use crate::application::presence::PresenceOracle;
use crate::domain::{LockDetectionPolicy, RepoSelection};
use crate::error::Result;
use crate::port::CommandSpec;
use async_trait::async_trait;
use std::sync::Arc;

const YUM: &str = "/usr/bin/yum";

pub struct YumProvider {
    oracle: Arc<PresenceOracle>,
    policy: Arc<LockDetectionPolicy>,
}

impl YumProvider {
    pub fn new(oracle: Arc<PresenceOracle>, policy: Arc<LockDetectionPolicy>) -> Self {
        Self { oracle, policy }
    }

    fn base_command(ctx: &ActionContext, verb: &str) -> CommandSpec {
        let cmd = ctx.command(YUM);
        let cmd = if ctx.logoutput() {
            cmd
        } else {
            cmd.args(["-d", "0", "-e", "0"])
        };
        cmd.args(["-y", verb])
    }

    /// `--disablerepo` / `--enablerepo` options for a repo selection
    ///
    /// With `use_repos`, everything not listed is disabled unless `skip_repos`
    /// names what to disable instead.
    fn repo_options(repos: &RepoSelection) -> Vec<String> {
        let skip = repos
            .skip_repos
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        if repos.use_repos.is_empty() {
            if skip.is_empty() {
                return Vec::new();
            }
            return vec![format!("--disablerepo={}", skip)];
        }

        let enable = repos
            .use_repos
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let disable = if skip.is_empty() { "*".to_string() } else { skip };

        vec![
            format!("--disablerepo={}", disable),
            format!("--enablerepo={}", enable),
        ]
    }

    async fn run(
        &self,
        ctx: &ActionContext,
        verb: &str,
        name: &str,
        repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        let cmd = Self::base_command(ctx, verb)
            .args(Self::repo_options(repos))
            .arg(name);
        let result = ctx.runner().checked_call_until_not_locked(&cmd).await?;
        Ok(ActionOutcome::Executed(result))
    }
}

#[async_trait]
impl PackageProvider for YumProvider {
    fn name(&self) -> &'static str {
        "yum"
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
        ctx.logger().info(&format!("Installing package {} ('{}')", name, YUM));
        self.run(ctx, "install", name, repos).await
    }

    async fn remove_package(&self, ctx: &ActionContext, name: &str) -> Result<ActionOutcome> {
        if let Some(skipped) = skip_if_absent(&self.oracle, ctx, name).await? {
            return Ok(skipped);
        }
        ctx.logger().info(&format!("Removing package {} ('{}')", name, YUM));
        self.run(ctx, "erase", name, &RepoSelection::default()).await
    }

    async fn upgrade_package(
        &self,
        ctx: &ActionContext,
        name: &str,
        repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        ctx.logger().info(&format!("Upgrading package {} ('{}')", name, YUM));
        self.run(ctx, "update", name, repos).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::OsFamily;

    fn provider(installed: &[&str]) -> YumProvider {
        YumProvider::new(
            oracle(installed),
            Arc::new(LockDetectionPolicy::for_family(OsFamily::RedHat)),
        )
    }

    #[test]
    fn test_repo_options() {
        assert!(YumProvider::repo_options(&RepoSelection::default()).is_empty());

        assert_eq!(
            YumProvider::repo_options(&RepoSelection::new(["HDP-UTILS", "HDP"], Vec::<String>::new())),
            vec!["--disablerepo=*", "--enablerepo=HDP,HDP-UTILS"]
        );

        assert_eq!(
            YumProvider::repo_options(&RepoSelection::new(["HDP"], ["epel", "base"])),
            vec!["--disablerepo=base,epel", "--enablerepo=HDP"]
        );

        assert_eq!(
            YumProvider::repo_options(&RepoSelection::new(Vec::<String>::new(), ["epel"])),
            vec!["--disablerepo=epel"]
        );
    }

    #[tokio::test]
    async fn test_install_command_line() {
        let h = ProviderHarness::new();
        let provider = provider(&[]);
        let ctx = h.context(provider.lock_policy(), false);

        provider
            .install_package(&ctx, "hadoop_2_6_0", &RepoSelection::new(["HDP"], Vec::<String>::new()))
            .await
            .unwrap();

        assert_eq!(
            h.executor.command_lines(),
            vec![
                "/usr/bin/yum -d 0 -e 0 -y install '--disablerepo=*' --enablerepo=HDP hadoop_2_6_0"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_yum_lock_is_waited_out() {
        let h = ProviderHarness::new();
        h.executor.push_result(
            1,
            "Existing lock /var/run/yum.pid: another copy is running as pid 3411.",
        );
        h.executor.push_result(0, "Installed: zookeeper");
        let provider = provider(&[]);
        let ctx = h.context(provider.lock_policy(), true);

        let outcome = provider
            .install_package(&ctx, "zookeeper", &RepoSelection::default())
            .await
            .unwrap();

        assert_eq!(outcome.result().unwrap().output, "Installed: zookeeper");
        assert_eq!(h.sleeper.count(), 1);
        assert_eq!(
            h.executor.command_lines()[1],
            "/usr/bin/yum -y install zookeeper"
        );
    }

    #[tokio::test]
    async fn test_remove_and_upgrade_verbs() {
        let h = ProviderHarness::new();
        let provider = provider(&["zookeeper-server"]);
        let ctx = h.context(provider.lock_policy(), false);

        provider.remove_package(&ctx, "zookeeper-server").await.unwrap();
        provider
            .upgrade_package(&ctx, "zookeeper-server", &RepoSelection::default())
            .await
            .unwrap();

        assert_eq!(
            h.executor.command_lines(),
            vec![
                "/usr/bin/yum -d 0 -e 0 -y erase zookeeper-server".to_string(),
                "/usr/bin/yum -d 0 -e 0 -y update zookeeper-server".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_install_skips_versioned_match() {
        let h = ProviderHarness::new();
        let provider = provider(&["zookeeper-3.4.6"]);
        let ctx = h.context(provider.lock_policy(), false);

        let outcome = provider
            .install_package(&ctx, "zookeeper-*", &RepoSelection::default())
            .await
            .unwrap();

        assert!(matches!(outcome, ActionOutcome::Skipped { .. }));
        assert_eq!(h.executor.call_count(), 0);
    }
}
