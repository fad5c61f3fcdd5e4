// apt-get provider (Debian family)

use super::{skip_if_absent, skip_if_installed, ActionContext, ActionOutcome, PackageProvider};
use crate::application::presence::PresenceOracle;
use crate::domain::{LockDetectionPolicy, RepoSelection};
use crate::error::{PackageError, Result};
use crate::port::{CommandSpec, ExecutionError};
use async_trait::async_trait;
use std::sync::Arc;

const APT_GET: &str = "/usr/bin/apt-get";

pub struct AptProvider {
    oracle: Arc<PresenceOracle>,
    policy: Arc<LockDetectionPolicy>,
}

impl AptProvider {
    pub fn new(oracle: Arc<PresenceOracle>, policy: Arc<LockDetectionPolicy>) -> Self {
        Self { oracle, policy }
    }

    fn install_command(ctx: &ActionContext, name: &str) -> CommandSpec {
        let mut cmd = ctx.command(APT_GET);
        if !ctx.logoutput() {
            cmd = cmd.arg("-q");
        }
        cmd.args([
            "-o",
            "Dpkg::Options::=--force-confdef",
            "--allow-unauthenticated",
            "--assume-yes",
            "install",
        ])
        .arg(name)
        .env("DEBIAN_FRONTEND", "noninteractive")
    }

    fn ignore_repos(ctx: &ActionContext, repos: &RepoSelection) {
        if !repos.is_empty() {
            ctx.logger().debug(&format!(
                "apt-get has no per-invocation repository filter; ignoring use_repos={:?} skip_repos={:?}",
                repos.use_repos, repos.skip_repos
            ));
        }
    }

    async fn install_or_refresh(&self, ctx: &ActionContext, name: &str) -> Result<ActionOutcome> {
        let cmd = Self::install_command(ctx, name);
        let result = ctx.runner().call_until_not_locked(&cmd).await?;
        if result.is_success() {
            return Ok(ActionOutcome::Executed(result));
        }

        // Lock attempts are spent; refreshing the index would only wait again
        if ctx.runner().policy().is_locked_output(&result.output) {
            let err = ExecutionError::NonZeroExit {
                command: cmd.to_string(),
                code: result.exit_code,
                output: result.output,
            };
            return Err(PackageError::from_execution(
                err,
                ctx.runner().settings().locked_tries.max(1),
            ));
        }

        // A stale package index is the usual cause; refresh it and try once more
        ctx.logger().info(&format!(
            "Execution of '{}' returned {}. {}",
            cmd, result.exit_code, result.output
        ));
        let refresh = ctx
            .command(APT_GET)
            .args(["update", "-qq"])
            .env("DEBIAN_FRONTEND", "noninteractive");
        let refreshed = ctx.runner().call_until_not_locked(&refresh).await?;
        if !refreshed.is_success() {
            ctx.logger().info(&format!(
                "Execution of '{}' returned {}. {}",
                refresh, refreshed.exit_code, refreshed.output
            ));
        }

        let result = ctx.runner().checked_call_until_not_locked(&cmd).await?;
        Ok(ActionOutcome::Executed(result))
    }
}

#[async_trait]
impl PackageProvider for AptProvider {
    fn name(&self) -> &'static str {
        "apt"
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
        Self::ignore_repos(ctx, repos);
        ctx.logger().info(&format!("Installing package {} ('{}')", name, APT_GET));
        self.install_or_refresh(ctx, name).await
    }

    async fn remove_package(&self, ctx: &ActionContext, name: &str) -> Result<ActionOutcome> {
        if let Some(skipped) = skip_if_absent(&self.oracle, ctx, name).await? {
            return Ok(skipped);
        }
        ctx.logger().info(&format!("Removing package {} ('{}')", name, APT_GET));
        let cmd = ctx
            .command(APT_GET)
            .args(["-y", "-q", "remove"])
            .arg(name)
            .env("DEBIAN_FRONTEND", "noninteractive");
        let result = ctx.runner().checked_call_until_not_locked(&cmd).await?;
        Ok(ActionOutcome::Executed(result))
    }

    async fn upgrade_package(
        &self,
        ctx: &ActionContext,
        name: &str,
        repos: &RepoSelection,
    ) -> Result<ActionOutcome> {
        // `apt-get install` upgrades an installed package in place
        Self::ignore_repos(ctx, repos);
        ctx.logger().info(&format!("Upgrading package {} ('{}')", name, APT_GET));
        self.install_or_refresh(ctx, name).await
    }
}
