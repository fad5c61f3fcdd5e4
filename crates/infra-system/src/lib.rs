// pkgagent Infrastructure - System adapters
// Implements: CommandExecutor, PackageDatabase (dpkg status file, command line)

pub mod cli_database;
pub mod dpkg_status;
pub mod os_detection;
pub mod port_probe;
pub mod privilege;
pub mod shell_executor;

pub use cli_database::CommandLineDatabase;
pub use dpkg_status::{DpkgStatusDatabase, DPKG_STATUS_PATH};
pub use os_detection::{detect_os_family, parse_os_release, OsRelease, OS_RELEASE_PATH};
pub use port_probe::{PortProbe, ProbeOutcome, DEFAULT_PROBE_TIMEOUT};
pub use privilege::{is_readable, is_root};
pub use shell_executor::ShellCommandExecutor;
