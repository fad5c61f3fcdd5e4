// dpkg status-file database
// reason: the status file is plain text, so no dpkg-query subprocess is needed
use async_trait::async_trait;
use pkgagent_core::port::{DatabaseError, PackageDatabase};
use std::path::PathBuf;
use tracing::debug;

/// Default location of the dpkg status file
pub const DPKG_STATUS_PATH: &str = "/var/lib/dpkg/status";

pub(crate) const INSTALLED: &str = "install ok installed";

/// Reads installed package names from `/var/lib/dpkg/status`
#[derive(Debug, Clone)]
pub struct DpkgStatusDatabase {
    path: PathBuf,
}

impl DpkgStatusDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for DpkgStatusDatabase {
    fn default() -> Self {
        Self::new(DPKG_STATUS_PATH)
    }
}

/// Names of the stanzas whose `Status` is `install ok installed`
///
/// Stanzas are separated by blank lines; continuation lines start with
/// whitespace and are ignored.
pub fn parse_installed(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut package: Option<&str> = None;
    let mut installed = false;

    for line in content.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if let (Some(name), true) = (package.take(), installed) {
                names.push(name.to_string());
            }
            installed = false;
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            match key {
                "Package" => package = Some(value.trim()),
                "Status" => installed = value.trim() == INSTALLED,
                _ => {}
            }
        }
    }

    names
}

#[async_trait]
impl PackageDatabase for DpkgStatusDatabase {
    fn strategy(&self) -> &'static str {
        "dpkg-status"
    }

    async fn installed_names(&self) -> Result<Vec<String>, DatabaseError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DatabaseError::Unavailable {
                location: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let names = parse_installed(&content);
        debug!(path = %self.path.display(), count = names.len(), "Read dpkg status file");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::assert_err;

    const STATUS: &str = "\
Package: zookeeper
Status: install ok installed
Priority: optional
Version: 3.4.6-1
Description: centralized coordination service
 ZooKeeper is a centralized service for maintaining configuration
 Package: not-a-real-stanza

Package: hadoop-client
Status: deinstall ok config-files
Version: 2.6.0

Package: hadoop-2-6-0-hdfs
Version: 2.6.0
Status: install ok installed
";

    #[test]
    fn test_parse_installed_only() {
        assert_eq!(
            parse_installed(STATUS),
            vec!["zookeeper".to_string(), "hadoop-2-6-0-hdfs".to_string()]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_installed("").is_empty());
    }

    #[tokio::test]
    async fn test_reads_status_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STATUS.as_bytes()).unwrap();

        let db = DpkgStatusDatabase::new(file.path());
        let names = db.installed_names().await.unwrap();

        assert_eq!(names.len(), 2);
        assert_eq!(db.strategy(), "dpkg-status");
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let db = DpkgStatusDatabase::new("/nonexistent/dpkg/status");

        let err = assert_err!(db.installed_names().await);

        assert!(matches!(err, DatabaseError::Unavailable { .. }));
    }
}
