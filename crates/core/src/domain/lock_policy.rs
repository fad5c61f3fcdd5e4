// Lock Detection Policy
//
// Recognises the messages package managers print while another process
// holds their exclusive lock.

use super::error::{DomainError, Result};
use super::os_family::OsFamily;
use regex::Regex;

const APT_LOCK_MARKERS: &[&str] = &[
    "Unable to lock the administration directory",
    "Could not get lock",
];

const YUM_LOCK_MARKERS: &[&str] = &["Existing lock "];

const ZYPPER_LOCK_MARKERS: &[&str] = &["System management is locked"];

#[derive(Debug, Clone)]
enum Signature {
    Literal(String),
    Pattern(Regex),
}

impl Signature {
    fn matches(&self, text: &str) -> bool {
        match self {
            Signature::Literal(marker) => text.contains(marker.as_str()),
            Signature::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// Read-only set of lock-wait signatures
#[derive(Debug, Clone, Default)]
pub struct LockDetectionPolicy {
    patterns: Vec<Signature>,
}

impl LockDetectionPolicy {
    /// Policy matching any of the given literal substrings
    pub fn from_substrings<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = markers
            .into_iter()
            .map(|m| Signature::Literal(m.as_ref().to_string()))
            .collect();
        Self { patterns }
    }

    /// Policy matching any of the given regular expressions
    pub fn from_regexes<I, S>(expressions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::default();
        for expr in expressions {
            policy = policy.with_regex(expr.as_ref())?;
        }
        Ok(policy)
    }

    /// Built-in signatures of the family's package manager
    pub fn for_family(family: OsFamily) -> Self {
        match family {
            OsFamily::Debian => Self::from_substrings(APT_LOCK_MARKERS),
            OsFamily::RedHat => Self::from_substrings(YUM_LOCK_MARKERS),
            OsFamily::Suse => Self::from_substrings(ZYPPER_LOCK_MARKERS),
        }
    }

    pub fn with_regex(mut self, expr: &str) -> Result<Self> {
        let regex = Regex::new(expr).map_err(|e| DomainError::InvalidLockPattern {
            pattern: expr.to_string(),
            reason: e.to_string(),
        })?;
        self.patterns.push(Signature::Pattern(regex));
        Ok(self)
    }

    /// True if `text` carries any lock-wait signature
    pub fn is_locked_output(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(text))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
