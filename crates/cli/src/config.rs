// Agent configuration
// Layers: built-in defaults, then the config file, then PKGAGENT_* variables

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use pkgagent_core::domain::{LockDetectionPolicy, OsFamily, PackageResource, RetrySettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "~/.pkgagent/agent.toml";
const ENV_PREFIX: &str = "PKGAGENT";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Skips OS detection when set
    pub os_family: Option<OsFamily>,
    pub retry: RetryConfig,
    pub log: LogConfig,
    pub probe: ProbeConfig,
    /// Extra lock-wait regexes, added to the family's built-in signatures
    pub lock_patterns: LockPatternConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub locked_tries: u32,
    /// Seconds
    pub locked_try_sleep: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let defaults = RetrySettings::default();
        Self {
            locked_tries: defaults.locked_tries,
            locked_try_sleep: defaults.locked_try_sleep.as_secs(),
        }
    }
}

impl RetryConfig {
    pub fn settings(&self) -> Result<RetrySettings> {
        RetrySettings::new(self.locked_tries, Duration::from_secs(self.locked_try_sleep))
            .context("Invalid retry configuration")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// EnvFilter directive, overridden by RUST_LOG
    pub level: String,
    pub format: LogFormat,
    /// Daily-rolling log file, in addition to stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "pkgagent=info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_ms: u64,
    /// Used when a probed URI has no host
    pub host: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1500,
            host: "localhost".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LockPatternConfig {
    pub debian: Vec<String>,
    pub redhat: Vec<String>,
    pub suse: Vec<String>,
}

impl LockPatternConfig {
    /// Lock policy for `family`, or None when no extra patterns are configured
    pub fn policy_for(&self, family: OsFamily) -> Result<Option<LockDetectionPolicy>> {
        let extra = match family {
            OsFamily::Debian => &self.debian,
            OsFamily::RedHat => &self.redhat,
            OsFamily::Suse => &self.suse,
        };
        if extra.is_empty() {
            return Ok(None);
        }

        let mut policy = LockDetectionPolicy::for_family(family);
        for expr in extra {
            policy = policy
                .with_regex(expr)
                .with_context(|| format!("Invalid lock pattern for {}", family))?;
        }
        Ok(Some(policy))
    }
}

impl AgentConfig {
    /// Load the layered configuration
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (
                PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).into_owned()),
                false,
            ),
        };

        Config::builder()
            .add_source(File::from(path.as_path()).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize::<Self>)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }
}

/// Read a desired-state descriptor; the format follows the file extension
pub fn load_descriptor(path: &Path) -> Result<PackageResource> {
    Config::builder()
        .add_source(File::from(path))
        .build()
        .and_then(Config::try_deserialize::<PackageResource>)
        .with_context(|| format!("Invalid package descriptor {}", path.display()))
}
