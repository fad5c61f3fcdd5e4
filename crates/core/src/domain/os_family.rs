// OS Family - selects the package-manager variant for a host

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Package-manager family of a managed host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// dpkg / apt-get (Debian, Ubuntu)
    Debian,
    /// rpm / yum (RHEL, CentOS, Fedora, Amazon Linux)
    RedHat,
    /// rpm / zypper (SLES, openSUSE)
    Suse,
}

impl OsFamily {
    /// Map an os-release `ID` or `ID_LIKE` token to a family
    pub fn from_os_release_id(id: &str) -> Option<Self> {
        let id = id.trim().trim_matches('"').to_ascii_lowercase();
        match id.as_str() {
            "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some(OsFamily::Debian),
            "rhel" | "redhat" | "centos" | "fedora" | "rocky" | "almalinux" | "amzn" | "ol"
            | "oraclelinux" => Some(OsFamily::RedHat),
            "suse" | "sles" | "sled" => Some(OsFamily::Suse),
            other if other.starts_with("opensuse") => Some(OsFamily::Suse),
            _ => None,
        }
    }

    /// Resolve a family from an `ID` value and a whitespace-separated `ID_LIKE` list
    pub fn detect(id: &str, id_like: Option<&str>) -> Option<Self> {
        Self::from_os_release_id(id).or_else(|| {
            id_like?
                .split_whitespace()
                .find_map(Self::from_os_release_id)
        })
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsFamily::Debian => write!(f, "debian"),
            OsFamily::RedHat => write!(f, "redhat"),
            OsFamily::Suse => write!(f, "suse"),
        }
    }
}

impl FromStr for OsFamily {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_os_release_id(s).ok_or_else(|| DomainError::UnknownOsFamily(s.to_string()))
    }
}
