// Package Resource Domain Model
//
// One desired-state request: which package, which action, and how patiently
// to wait for the package-manager lock.

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

/// Default number of attempts when the package manager is locked
pub const DEFAULT_LOCKED_TRIES: u32 = 5;

/// Default pause between lock-contention retries (seconds)
pub const DEFAULT_LOCKED_TRY_SLEEP_SECS: u64 = 30;

/// Desired package action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageAction {
    Install,
    Upgrade,
    Remove,
}

impl std::fmt::Display for PackageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageAction::Install => write!(f, "install"),
            PackageAction::Upgrade => write!(f, "upgrade"),
            PackageAction::Remove => write!(f, "remove"),
        }
    }
}

impl FromStr for PackageAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "install" => Ok(PackageAction::Install),
            "upgrade" => Ok(PackageAction::Upgrade),
            "remove" => Ok(PackageAction::Remove),
            other => Err(DomainError::UnknownAction(other.to_string())),
        }
    }
}

/// Whether command output of a package action is streamed to the log
///
/// `Inherit` defers to the active log level (streamed only at debug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Enabled,
    Disabled,
    #[default]
    Inherit,
}

impl From<Option<bool>> for LogOutput {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => LogOutput::Enabled,
            Some(false) => LogOutput::Disabled,
            None => LogOutput::Inherit,
        }
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "enabled" | "yes" => Ok(LogOutput::Enabled),
            "false" | "disabled" | "no" => Ok(LogOutput::Disabled),
            "" | "inherit" | "unset" => Ok(LogOutput::Inherit),
            other => Err(format!("invalid logoutput value: {}", other)),
        }
    }
}

// Descriptors write `logoutput = true|false`, omit it, or name the variant
#[derive(Deserialize)]
#[serde(untagged)]
enum LogOutputRepr {
    Flag(bool),
    Named(String),
}

impl<'de> Deserialize<'de> for LogOutput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Option::<LogOutputRepr>::deserialize(deserializer)? {
            None => Ok(LogOutput::Inherit),
            Some(LogOutputRepr::Flag(flag)) => Ok(LogOutput::from(Some(flag))),
            Some(LogOutputRepr::Named(name)) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Repositories to enable / disable for a single install or upgrade
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSelection {
    #[serde(default)]
    pub use_repos: BTreeSet<String>,
    #[serde(default)]
    pub skip_repos: BTreeSet<String>,
}

impl RepoSelection {
    pub fn new(
        use_repos: impl IntoIterator<Item = impl Into<String>>,
        skip_repos: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            use_repos: use_repos.into_iter().map(Into::into).collect(),
            skip_repos: skip_repos.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.use_repos.is_empty() && self.skip_repos.is_empty()
    }
}

/// Lock-contention retry budget for one package action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub locked_tries: u32,
    pub locked_try_sleep: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            locked_tries: DEFAULT_LOCKED_TRIES,
            locked_try_sleep: Duration::from_secs(DEFAULT_LOCKED_TRY_SLEEP_SECS),
        }
    }
}

impl RetrySettings {
    pub fn new(locked_tries: u32, locked_try_sleep: Duration) -> Result<Self> {
        let settings = Self {
            locked_tries,
            locked_try_sleep,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.locked_tries < 1 {
            return Err(DomainError::InvalidLockedTries(self.locked_tries));
        }
        Ok(())
    }
}

/// Wire shape of a desired-state descriptor
#[derive(Debug, Deserialize)]
struct RawPackageResource {
    package_name: String,
    #[serde(default)]
    version: Option<String>,
    action: PackageAction,
    #[serde(default)]
    use_repos: BTreeSet<String>,
    #[serde(default)]
    skip_repos: BTreeSet<String>,
    #[serde(default = "default_locked_tries")]
    locked_tries: u32,
    #[serde(default = "default_locked_try_sleep")]
    locked_try_sleep: u64,
    #[serde(default)]
    logoutput: LogOutput,
}

fn default_locked_tries() -> u32 {
    DEFAULT_LOCKED_TRIES
}

fn default_locked_try_sleep() -> u64 {
    DEFAULT_LOCKED_TRY_SLEEP_SECS
}

impl TryFrom<RawPackageResource> for PackageResource {
    type Error = DomainError;

    fn try_from(raw: RawPackageResource) -> Result<Self> {
        PackageResource::new(raw.package_name, raw.action)
            .with_version(raw.version)
            .with_repos(RepoSelection {
                use_repos: raw.use_repos,
                skip_repos: raw.skip_repos,
            })
            .with_retry(RetrySettings {
                locked_tries: raw.locked_tries,
                locked_try_sleep: Duration::from_secs(raw.locked_try_sleep),
            })
            .with_logoutput(raw.logoutput)
            .build()
    }
}

/// Declarative description of one package action and its retry policy
///
/// Built through [`PackageResourceBuilder`] (or deserialized from a
/// descriptor), validated once, then moved into the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPackageResource")]
pub struct PackageResource {
    name: String,
    version: Option<String>,
    action: PackageAction,
    repos: RepoSelection,
    retry: RetrySettings,
    logoutput: LogOutput,
}

impl PackageResource {
    /// Start building a resource for `name` with default retry policy
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: impl Into<String>, action: PackageAction) -> PackageResourceBuilder {
        PackageResourceBuilder {
            name: name.into(),
            version: None,
            action,
            repos: RepoSelection::default(),
            retry: RetrySettings::default(),
            logoutput: LogOutput::Inherit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn action(&self) -> PackageAction {
        self.action
    }

    pub fn repos(&self) -> &RepoSelection {
        &self.repos
    }

    pub fn retry(&self) -> RetrySettings {
        self.retry
    }

    pub fn logoutput(&self) -> LogOutput {
        self.logoutput
    }

    /// Package identifier handed to the package manager
    ///
    /// `name-version` when a version is pinned, otherwise the bare name.
    pub fn resolved_identifier(&self) -> String {
        resolve_identifier(&self.name, self.version.as_deref())
    }
}

/// Join a package name and an optional version into one identifier
pub fn resolve_identifier(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{}-{}", name, version),
        None => name.to_string(),
    }
}

/// Builder for [`PackageResource`]
#[derive(Debug, Clone)]
pub struct PackageResourceBuilder {
    name: String,
    version: Option<String>,
    action: PackageAction,
    repos: RepoSelection,
    retry: RetrySettings,
    logoutput: LogOutput,
}

impl PackageResourceBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_repos(mut self, repos: RepoSelection) -> Self {
        self.repos = repos;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_logoutput(mut self, logoutput: LogOutput) -> Self {
        self.logoutput = logoutput;
        self
    }

    /// Validate invariants and produce the resource
    pub fn build(self) -> Result<PackageResource> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::EmptyPackageName);
        }

        let version = match self.version {
            Some(v) if v.trim().is_empty() => return Err(DomainError::EmptyVersion),
            Some(v) => Some(v.trim().to_string()),
            None => None,
        };

        self.retry.validate()?;

        Ok(PackageResource {
            name,
            version,
            action: self.action,
            repos: self.repos,
            retry: self.retry,
            logoutput: self.logoutput,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_identifier_with_version() {
        assert_eq!(resolve_identifier("hadoop", Some("2.6.0")), "hadoop-2.6.0");
    }

    #[test]
    fn test_resolve_identifier_without_version() {
        assert_eq!(resolve_identifier("hadoop", None), "hadoop");
    }

    #[test]
    fn test_builder_defaults() {
        let resource = PackageResource::new("zookeeper", PackageAction::Install)
            .build()
            .unwrap();

        assert_eq!(resource.retry().locked_tries, DEFAULT_LOCKED_TRIES);
        assert_eq!(
            resource.retry().locked_try_sleep,
            Duration::from_secs(DEFAULT_LOCKED_TRY_SLEEP_SECS)
        );
        assert_eq!(resource.logoutput(), LogOutput::Inherit);
        assert!(resource.repos().is_empty());
        assert_eq!(resource.resolved_identifier(), "zookeeper");
    }

    #[test]
    fn test_builder_rejects_empty_name() {
        let err = PackageResource::new("   ", PackageAction::Remove)
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::EmptyPackageName);
    }

    #[test]
    fn test_builder_rejects_zero_tries() {
        let err = PackageResource::new("hadoop", PackageAction::Install)
            .with_retry(RetrySettings {
                locked_tries: 0,
                locked_try_sleep: Duration::ZERO,
            })
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidLockedTries(0));
    }

    #[test]
    fn test_builder_rejects_blank_version() {
        let err = PackageResource::new("hadoop", PackageAction::Install)
            .version("")
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::EmptyVersion);
    }

    #[test]
    fn test_deserialize_descriptor() {
        let resource: PackageResource = serde_json::from_value(serde_json::json!({
            "package_name": "hadoop",
            "version": "2.6.0",
            "action": "upgrade",
            "use_repos": ["HDP-2.6", "HDP-UTILS"],
            "skip_repos": ["epel"],
            "locked_tries": 3,
            "locked_try_sleep": 10,
            "logoutput": true
        }))
        .unwrap();

        assert_eq!(resource.action(), PackageAction::Upgrade);
        assert_eq!(resource.resolved_identifier(), "hadoop-2.6.0");
        assert_eq!(resource.repos().use_repos.len(), 2);
        assert!(resource.repos().skip_repos.contains("epel"));
        assert_eq!(resource.retry().locked_tries, 3);
        assert_eq!(resource.retry().locked_try_sleep, Duration::from_secs(10));
        assert_eq!(resource.logoutput(), LogOutput::Enabled);
    }

    #[test]
    fn test_deserialize_descriptor_defaults_and_validation() {
        let resource: PackageResource = serde_json::from_value(serde_json::json!({
            "package_name": "zookeeper",
            "action": "remove",
            "logoutput": null
        }))
        .unwrap();
        assert_eq!(resource.logoutput(), LogOutput::Inherit);
        assert_eq!(resource.retry(), RetrySettings::default());

        let invalid = serde_json::from_value::<PackageResource>(serde_json::json!({
            "package_name": "zookeeper",
            "action": "install",
            "locked_tries": 0
        }));
        assert!(invalid.is_err());

        let unknown_action = serde_json::from_value::<PackageResource>(serde_json::json!({
            "package_name": "zookeeper",
            "action": "purge"
        }));
        assert!(unknown_action.is_err());
    }

    #[test]
    fn test_logoutput_parsing() {
        assert_eq!("false".parse::<LogOutput>().unwrap(), LogOutput::Disabled);
        assert_eq!("inherit".parse::<LogOutput>().unwrap(), LogOutput::Inherit);
        assert!("maybe".parse::<LogOutput>().is_err());
        assert_eq!(LogOutput::from(Some(true)), LogOutput::Enabled);
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("Install".parse::<PackageAction>().unwrap(), PackageAction::Install);
        assert!(matches!(
            "purge".parse::<PackageAction>(),
            Err(DomainError::UnknownAction(_))
        ));
    }
}
