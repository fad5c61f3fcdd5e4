// OS family detection
// reason: sysinfo already knows the distribution ID; ID_LIKE comes from os-release
use pkgagent_core::domain::OsFamily;
use pkgagent_core::error::{PackageError, Result};
use std::path::Path;
use sysinfo::System;
use tracing::{debug, info};

/// Default location of the os-release file
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// `ID` and `ID_LIKE` values of an os-release file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: Option<String>,
    pub id_like: Option<String>,
}

/// Parse the `KEY=value` lines of an os-release file
pub fn parse_os_release(content: &str) -> OsRelease {
    let mut release = OsRelease::default();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
        match key.trim() {
            "ID" => release.id = Some(value),
            "ID_LIKE" => release.id_like = Some(value),
            _ => {}
        }
    }
    release
}

/// Determine the host's package-manager family
///
/// An explicit override wins; otherwise sysinfo's distribution ID is tried,
/// then the `ID_LIKE` list of `os_release_path`.
pub fn detect_os_family(
    override_family: Option<OsFamily>,
    os_release_path: &Path,
) -> Result<OsFamily> {
    if let Some(family) = override_family {
        debug!(family = %family, "Using configured OS family");
        return Ok(family);
    }

    let distribution = System::distribution_id();
    let release = std::fs::read_to_string(os_release_path)
        .map(|content| parse_os_release(&content))
        .unwrap_or_default();

    let id = release.id.as_deref().unwrap_or(distribution.as_str());
    let family = OsFamily::from_os_release_id(&distribution)
        .or_else(|| OsFamily::detect(id, release.id_like.as_deref()))
        .ok_or_else(|| {
            PackageError::Config(format!(
                "Unsupported distribution '{}' (ID_LIKE: {}); set os_family explicitly",
                id,
                release.id_like.as_deref().unwrap_or("-")
            ))
        })?;

    info!(distribution = %distribution, family = %family, "Detected OS family");
    Ok(family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_os_release() {
        let release = parse_os_release(
            "NAME=\"Rocky Linux\"\nID=\"rocky\"\nID_LIKE=\"rhel centos fedora\"\n# comment\n\nVERSION_ID=\"9.3\"\n",
        );
        assert_eq!(release.id.as_deref(), Some("rocky"));
        assert_eq!(release.id_like.as_deref(), Some("rhel centos fedora"));
    }

    #[test]
    fn test_override_wins() {
        let family =
            detect_os_family(Some(OsFamily::Suse), Path::new("/nonexistent/os-release")).unwrap();
        assert_eq!(family, OsFamily::Suse);
    }

    #[test]
    fn test_id_like_fallback_from_file() {
        // Only meaningful where sysinfo does not already recognise the host
        if OsFamily::from_os_release_id(&System::distribution_id()).is_some() {
            return;
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ID=someubuntuspin\nID_LIKE=\"ubuntu debian\"").unwrap();

        let family = detect_os_family(None, file.path()).unwrap();
        assert_eq!(family, OsFamily::Debian);
    }
}
