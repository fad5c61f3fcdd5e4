// Dependency wiring for one agent run

use crate::config::AgentConfig;
use anyhow::Result;
use pkgagent_core::application::{provider_for, PackageDispatcher, PresenceOracle};
use pkgagent_core::domain::OsFamily;
use pkgagent_core::port::{
    CommandExecutor, PackageDatabase, Sleeper, TokioSleeper, TracingActionLogger,
};
use pkgagent_infra_sqlite::{RpmSqliteDatabase, RPMDB_SQLITE_PATH};
use pkgagent_infra_system::{
    detect_os_family, is_readable, is_root, CommandLineDatabase, DpkgStatusDatabase,
    ShellCommandExecutor, DPKG_STATUS_PATH, OS_RELEASE_PATH,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// On-disk package databases read in-process
#[derive(Debug, Clone)]
pub struct DatabasePaths {
    pub dpkg_status: PathBuf,
    pub rpmdb_sqlite: PathBuf,
}

impl Default for DatabasePaths {
    fn default() -> Self {
        Self {
            dpkg_status: PathBuf::from(DPKG_STATUS_PATH),
            rpmdb_sqlite: PathBuf::from(RPMDB_SQLITE_PATH),
        }
    }
}

/// Pick how installed packages are listed, once per run
///
/// The database file is read in-process when this process may read it;
/// otherwise the family's query command is used.
pub fn resolve_package_database(
    family: OsFamily,
    executor: Arc<dyn CommandExecutor>,
    paths: &DatabasePaths,
) -> Arc<dyn PackageDatabase> {
    let database: Arc<dyn PackageDatabase> = match family {
        OsFamily::Debian if is_readable(&paths.dpkg_status) => {
            Arc::new(DpkgStatusDatabase::new(&paths.dpkg_status))
        }
        OsFamily::RedHat | OsFamily::Suse if is_readable(&paths.rpmdb_sqlite) => {
            Arc::new(RpmSqliteDatabase::new(&paths.rpmdb_sqlite))
        }
        _ => Arc::new(CommandLineDatabase::for_family(executor, family)),
    };

    info!(family = %family, strategy = database.strategy(), "Resolved package database");
    database
}

pub struct Agent {
    pub family: OsFamily,
    pub oracle: Arc<PresenceOracle>,
    pub dispatcher: PackageDispatcher,
}

impl Agent {
    /// Wire the production adapters
    pub fn build(config: &AgentConfig) -> Result<Self> {
        let family = detect_os_family(config.os_family, Path::new(OS_RELEASE_PATH))?;
        let executor: Arc<dyn CommandExecutor> =
            Arc::new(ShellCommandExecutor::new(!is_root(), None));
        let database =
            resolve_package_database(family, executor.clone(), &DatabasePaths::default());
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);

        Self::assemble(config, family, executor, database, sleeper)
    }

    /// Wire an agent from explicit adapters
    pub fn assemble(
        config: &AgentConfig,
        family: OsFamily,
        executor: Arc<dyn CommandExecutor>,
        database: Arc<dyn PackageDatabase>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let oracle = Arc::new(PresenceOracle::new(database));
        let policy = config.lock_patterns.policy_for(family)?;
        let provider = provider_for(family, oracle.clone(), policy);
        let dispatcher = PackageDispatcher::new(
            provider,
            executor,
            sleeper,
            Arc::new(TracingActionLogger),
        );

        Ok(Self {
            family,
            oracle,
            dispatcher,
        })
    }
}
