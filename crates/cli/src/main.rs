//! pkgagent - apply package actions on a managed host
//! install / upgrade / remove with lock-aware retries, presence checks, port probes

mod agent;
mod config;
mod logging;

use agent::Agent;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use config::{load_descriptor, AgentConfig};
use pkgagent_core::application::ActionOutcome;
use pkgagent_core::domain::{LogOutput, OsFamily, PackageAction, PackageResource, RepoSelection};
use pkgagent_core::PackageError;
use pkgagent_infra_system::{PortProbe, ProbeOutcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "pkgagent")]
#[command(about = "Package actions with lock-aware retries", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.pkgagent/agent.toml)
    #[arg(long, global = true, env = "PKGAGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Skip OS detection (debian, redhat, suse)
    #[arg(long, global = true)]
    os_family: Option<OsFamily>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a package unless it is already present
    Install(ActionArgs),

    /// Upgrade a package in place
    Upgrade(ActionArgs),

    /// Remove a package if it is present
    Remove(ActionArgs),

    /// Apply a package descriptor file (toml, json or yaml)
    Apply {
        descriptor: PathBuf,
    },

    /// Check whether a package matching PATTERN is installed (exit 0 / 1)
    Installed {
        /// Package name, `?` and `*` allowed
        pattern: String,
    },

    /// Check that a TCP port accepts connections (exit 0 OK / 2 CRITICAL)
    Probe {
        /// host, host:port or scheme://host:port/...
        uri: String,

        /// Port used when URI has none
        #[arg(long)]
        default_port: u16,

        /// Host used when URI has none
        #[arg(long)]
        host: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ActionArgs {
    /// Package name
    name: String,

    /// Package version, appended as NAME-VERSION
    #[arg(long = "version")]
    package_version: Option<String>,

    /// Repository to enable (repeatable)
    #[arg(long = "use-repo")]
    use_repos: Vec<String>,

    /// Repository to disable (repeatable)
    #[arg(long = "skip-repo")]
    skip_repos: Vec<String>,

    /// Attempts while the package manager is locked
    #[arg(long)]
    locked_tries: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    locked_try_sleep: Option<u64>,

    /// Echo package manager output (true / false)
    #[arg(long)]
    logoutput: Option<bool>,
}

impl ActionArgs {
    fn into_resource(self, action: PackageAction, config: &AgentConfig) -> Result<PackageResource> {
        let mut retry = config.retry.clone();
        if let Some(tries) = self.locked_tries {
            retry.locked_tries = tries;
        }
        if let Some(sleep) = self.locked_try_sleep {
            retry.locked_try_sleep = sleep;
        }

        PackageResource::new(self.name, action)
            .with_version(self.package_version)
            .with_repos(RepoSelection::new(self.use_repos, self.skip_repos))
            .with_retry(retry.settings()?)
            .with_logoutput(LogOutput::from(self.logoutput))
            .build()
            .context("Invalid package request")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if cli.os_family.is_some() {
        config.os_family = cli.os_family;
    }
    let _log_guard = logging::init_logging(&config.log)?;

    info!("pkgagent v{} starting...", pkgagent_core::VERSION);

    match cli.command {
        Commands::Install(args) => {
            let resource = args.into_resource(PackageAction::Install, &config)?;
            apply(&config, resource).await
        }
        Commands::Upgrade(args) => {
            let resource = args.into_resource(PackageAction::Upgrade, &config)?;
            apply(&config, resource).await
        }
        Commands::Remove(args) => {
            let resource = args.into_resource(PackageAction::Remove, &config)?;
            apply(&config, resource).await
        }
        Commands::Apply { descriptor } => {
            let resource = load_descriptor(&descriptor)?;
            apply(&config, resource).await
        }
        Commands::Installed { pattern } => {
            let agent = Agent::build(&config)?;
            let installed = agent
                .oracle
                .is_installed(&pattern)
                .await
                .with_context(|| format!("Presence check for '{}' failed", pattern))?;

            if installed {
                println!("{}", format!("✓ {} is installed", pattern).green().bold());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{}", format!("✗ {} is not installed", pattern).yellow());
                Ok(ExitCode::from(1))
            }
        }
        Commands::Probe {
            uri,
            default_port,
            host,
            json,
        } => {
            let host = host.unwrap_or_else(|| config.probe.host.clone());
            let outcome = PortProbe::new(host, config.probe.timeout())
                .check(&uri, default_port)
                .await;

            if json {
                println!("{}", serde_json::to_string(&outcome)?);
            } else {
                print_probe(&outcome);
            }
            Ok(if outcome.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
    }
}

async fn apply(config: &AgentConfig, resource: PackageResource) -> Result<ExitCode> {
    let agent = Agent::build(config)?;
    let action = resource.action();
    let identifier = resource.resolved_identifier();

    match agent.dispatcher.dispatch(resource).await {
        Ok(ActionOutcome::Executed(result)) => {
            println!(
                "{}",
                format!("✓ {} {} (exit {})", action, identifier, result.exit_code)
                    .green()
                    .bold()
            );
            Ok(ExitCode::SUCCESS)
        }
        Ok(ActionOutcome::Skipped { reason }) => {
            println!("{}", format!("• {}", reason).cyan());
            Ok(ExitCode::SUCCESS)
        }
        Err(PackageError::CommandFailure {
            command,
            exit_code,
            output,
            attempts,
            ..
        }) => {
            println!("{}", format!("✗ {} {} failed", action, identifier).red().bold());
            println!("  command:  {}", command);
            println!(
                "  exit:     {}",
                exit_code.map_or_else(|| "-".to_string(), |c| c.to_string())
            );
            println!("  attempts: {}", attempts);
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(ExitCode::from(
                exit_code.and_then(|c| u8::try_from(c).ok()).filter(|c| *c != 0).unwrap_or(1),
            ))
        }
        Err(e) => Err(e).with_context(|| format!("{} {} failed", action, identifier)),
    }
}

fn print_probe(outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Ok { .. } => println!("{} {}", "OK".green().bold(), outcome),
        ProbeOutcome::Critical { .. } => println!("{} {}", "CRITICAL".red().bold(), outcome),
    }
}
