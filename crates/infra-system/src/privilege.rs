// Privilege checks used to pick a package database strategy
use std::path::Path;

/// Whether the current process can read `path`
///
/// Uses the real uid, as `access(2)` does.
#[cfg(unix)]
pub fn is_readable(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    access(path, AccessFlags::R_OK).is_ok()
}

#[cfg(not(unix))]
pub fn is_readable(path: &Path) -> bool {
    std::fs::File::open(path).is_ok()
}

/// Whether the process runs as root (no sudo needed)
#[cfg(unix)]
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}
