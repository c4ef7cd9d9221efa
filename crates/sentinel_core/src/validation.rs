//! File-integrity gate run before any save is read or written.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core_api::Validation;
use crate::layout::{SIGNATURE, SIGNATURE_OFFSET};

pub const MIN_SAVE_SIZE: u64 = 1024;
pub const MAX_SAVE_SIZE: u64 = 16 * 1024;

static SAVE_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^game[a-z]\.fm$").expect("static regex"));

/// Why a candidate file is not an editable save. Checks run in declaration
/// order and stop at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("file is not readable: {}: {reason}", .path.display())]
    NotReadable { path: PathBuf, reason: String },

    #[error("file is too small ({size} bytes), likely not a valid save file")]
    TooSmall { size: u64 },

    #[error("file is too large ({size} bytes), expected ~12KB, max 16384")]
    TooLarge { size: u64 },

    #[error("file name must match 'gameX.fm' where X is A-Z (found: {0})")]
    BadFileName(String),

    #[error("file does not appear to be a Sentinel Worlds save (signature mismatch)")]
    SignatureMismatch,

    #[error("directory is not writable: {}: cannot save changes or create a backup", .0.display())]
    DirectoryNotWritable(PathBuf),
}

/// Runs every check against `path`, returning the first failure.
pub fn check(path: &Path) -> Result<(), ValidationFailure> {
    let metadata = fs::metadata(path).map_err(|_| ValidationFailure::NotFound(path.into()))?;
    if !metadata.is_file() {
        return Err(ValidationFailure::NotAFile(path.into()));
    }

    let mut file = File::open(path).map_err(|e| ValidationFailure::NotReadable {
        path: path.into(),
        reason: e.to_string(),
    })?;

    check_size(metadata.len())?;
    check_file_name(path)?;

    let mut signature = [0u8; SIGNATURE.len()];
    let read = file
        .seek(SeekFrom::Start(SIGNATURE_OFFSET as u64))
        .and_then(|_| file.read_exact(&mut signature));
    if read.is_err() || signature != SIGNATURE {
        return Err(ValidationFailure::SignatureMismatch);
    }
    drop(file);

    check_directory_writable(path)?;

    debug!(path = %path.display(), size = metadata.len(), "save file passed validation");
    Ok(())
}

/// `(valid, reason)` form of [`check`]; `reason` is empty iff valid.
pub fn validate(path: &Path) -> Validation {
    match check(path) {
        Ok(()) => Validation::ok(),
        Err(failure) => {
            warn!(path = %path.display(), "rejected save file: {failure}");
            Validation::rejected(failure.to_string())
        }
    }
}

/// Size and signature checks for a buffer that did not come from a path.
pub fn check_bytes(bytes: &[u8]) -> Result<(), ValidationFailure> {
    check_size(bytes.len() as u64)?;
    let signature = bytes.get(SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE.len());
    if signature != Some(SIGNATURE) {
        return Err(ValidationFailure::SignatureMismatch);
    }
    Ok(())
}

pub fn is_save_file_name(name: &str) -> bool {
    SAVE_FILE_NAME.is_match(name)
}

fn check_size(size: u64) -> Result<(), ValidationFailure> {
    if size < MIN_SAVE_SIZE {
        return Err(ValidationFailure::TooSmall { size });
    }
    if size > MAX_SAVE_SIZE {
        return Err(ValidationFailure::TooLarge { size });
    }
    Ok(())
}

fn check_file_name(path: &Path) -> Result<(), ValidationFailure> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if is_save_file_name(&name) {
        Ok(())
    } else {
        Err(ValidationFailure::BadFileName(name))
    }
}

fn check_directory_writable(path: &Path) -> Result<(), ValidationFailure> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    // The probe file is removed when it drops.
    tempfile::Builder::new()
        .prefix(".sentinel-probe")
        .tempfile_in(&dir)
        .map(|_| ())
        .map_err(|_| ValidationFailure::DirectoryNotWritable(dir))
}
