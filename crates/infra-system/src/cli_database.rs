// Command-line package database fallback
// Used when the database file is not readable by this process
use async_trait::async_trait;
use pkgagent_core::domain::OsFamily;
use crate::dpkg_status::INSTALLED;
use pkgagent_core::port::{CommandExecutor, CommandSpec, DatabaseError, PackageDatabase};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shape of the query's output lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryFormat {
    /// One package name per line
    NamePerLine,
    /// `<dpkg status> <package>`; only `install ok installed` rows count
    DpkgStatus,
}

/// Lists installed packages by asking `dpkg-query` or `rpm`
///
/// Diagnostic output of the query is never echoed to the log.
pub struct CommandLineDatabase {
    executor: Arc<dyn CommandExecutor>,
    command: CommandSpec,
    format: QueryFormat,
}

impl CommandLineDatabase {
    /// Custom query printing one package name per line
    pub fn new(executor: Arc<dyn CommandExecutor>, command: CommandSpec) -> Self {
        Self::with_format(executor, command, QueryFormat::NamePerLine)
    }

    fn with_format(
        executor: Arc<dyn CommandExecutor>,
        command: CommandSpec,
        format: QueryFormat,
    ) -> Self {
        Self {
            executor,
            command: command.logoutput(false),
            format,
        }
    }

    /// Query command for a package-manager family
    pub fn for_family(executor: Arc<dyn CommandExecutor>, family: OsFamily) -> Self {
        Self::for_family_at(executor, family, None)
    }

    /// Query command for a package-manager family, reading the database
    /// under `root` instead of the system default when given
    ///
    /// `root` is the dpkg admin directory or the rpm database path.
    pub fn for_family_at(
        executor: Arc<dyn CommandExecutor>,
        family: OsFamily,
        root: Option<&Path>,
    ) -> Self {
        match family {
            OsFamily::Debian => {
                let mut command = CommandSpec::new("dpkg-query");
                if let Some(root) = root {
                    command = command.arg(format!("--admindir={}", root.display()));
                }
                let command = command.args(["-W", "-f=${Status} ${Package}\\n"]);
                Self::with_format(executor, command, QueryFormat::DpkgStatus)
            }
            OsFamily::RedHat | OsFamily::Suse => {
                let mut command = CommandSpec::new("rpm");
                if let Some(root) = root {
                    command = command.arg("--dbpath").arg(root.display().to_string());
                }
                let command = command.args(["-qa", "--qf", "%{NAME}\\n"]);
                Self::with_format(executor, command, QueryFormat::NamePerLine)
            }
        }
    }

    fn parse(&self, output: &str) -> Vec<String> {
        let lines = output.lines().map(str::trim);
        match self.format {
            // stderr shares the stream; package names never contain whitespace
            QueryFormat::NamePerLine => lines
                .filter(|line| !line.is_empty() && !line.contains(char::is_whitespace))
                .map(String::from)
                .collect(),
            QueryFormat::DpkgStatus => lines
                .filter_map(|line| line.rsplit_once(' '))
                .filter(|(status, _)| status.trim() == INSTALLED)
                .map(|(_, name)| name.to_string())
                .collect(),
        }
    }
}

#[async_trait]
impl PackageDatabase for CommandLineDatabase {
    fn strategy(&self) -> &'static str {
        "command-line"
    }

    async fn installed_names(&self) -> Result<Vec<String>, DatabaseError> {
        let location = self.command.to_string();
        let result = self
            .executor
            .call(&self.command)
            .await
            .map_err(|e| DatabaseError::Unavailable {
                location: location.clone(),
                reason: e.to_string(),
            })?;

        if !result.is_success() {
            return Err(DatabaseError::Unavailable {
                location,
                reason: format!("exited with {}", result.exit_code),
            });
        }

        let names = self.parse(&result.output);

        debug!(command = %location, count = names.len(), "Listed installed packages");
        Ok(names)
    }
}
