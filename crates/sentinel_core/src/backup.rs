//! Best-effort `.bak` snapshots taken before a save is overwritten.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub const BACKUP_SUFFIX: &str = ".bak";

/// `gamea.fm` -> `gamea.fm.bak`, in the same directory.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Copies the current bytes of `path` next to it. A failed backup is logged
/// and reported as `false`; it never stops an edit.
pub fn backup(path: &Path) -> bool {
    let target = backup_path(path);
    match fs::read(path).and_then(|bytes| fs::write(&target, bytes)) {
        Ok(()) => {
            info!(backup = %target.display(), "backup created");
            true
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                backup = %target.display(),
                "could not create backup file, continuing without backup: {e}"
            );
            false
        }
    }
}
