/// Resolution of destination file-name collisions.
///
/// When the file a key would write already exists, the configured
/// [`DuplicateMode`] decides whether the write is skipped, replaces the old
/// file, goes to a fresh `name(n).ext` path, or aborts the session.
use crate::config::DuplicateMode;
use crate::sieve::{SieveError, SieveResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Effective destination for a write that collided with an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write to this path.
    Write(PathBuf),
    /// Do not write; the existing file wins.
    Skip,
}

/// Decides where a write to the already-existing `candidate` should go.
///
/// # Errors
///
/// Returns `SieveError::DuplicateHalt` under [`DuplicateMode::Halt`], and
/// `SieveError::OverwriteFailed` if the stale file cannot be removed.
pub fn resolve(candidate: &Path, mode: DuplicateMode) -> SieveResult<Resolution> {
    match mode {
        DuplicateMode::Maintain => Ok(Resolution::Skip),
        DuplicateMode::Overwrite => {
            fs::remove_file(candidate).map_err(|e| SieveError::OverwriteFailed {
                path: candidate.to_path_buf(),
                source: e,
            })?;
            Ok(Resolution::Write(candidate.to_path_buf()))
        }
        DuplicateMode::AssignUniqueName => Ok(Resolution::Write(unique_path(candidate))),
        DuplicateMode::Halt => Err(SieveError::DuplicateHalt {
            path: candidate.to_path_buf(),
        }),
    }
}

/// Returns `path` if it is free, otherwise the first free `stem(n).ext`
/// for `n = 1, 2, 3, ...`.
///
/// Example: with `a.png` and `a(1).png` taken, returns `a(2).png`.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().map(OsString::from).unwrap_or_default();
    let extension = path.extension();

    (1u64..)
        .map(|n| {
            let mut name = stem.clone();
            name.push(format!("({})", n));
            if let Some(ext) = extension {
                name.push(".");
                name.push(ext);
            }
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
