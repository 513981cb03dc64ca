/// Sort actions: copying or moving the displayed file into a bound destination.
///
/// This module executes one triage action at a time. It resolves name
/// collisions through [`crate::duplicate`], preserves file times on the
/// copy, and reports what was done as an [`Operation`].
use crate::config::{InstanceConfig, SieveMode};
use crate::duplicate::{self, Resolution};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents a single completed sort action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The file as it was found in the source directory.
    pub source: PathBuf,
    /// Where the file was written.
    pub destination: PathBuf,
    /// The key that triggered the action.
    pub key: char,
    /// Whether the source was kept or removed.
    pub mode: SieveMode,
}

/// Result of applying a key to the displayed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SieveOutcome {
    /// The file was copied or moved.
    Sorted(Operation),
    /// The destination name was taken and the existing file was kept.
    Kept { source: PathBuf, existing: PathBuf },
}

/// Errors that can occur while sorting a file.
#[derive(Debug)]
pub enum SieveError {
    /// A key reached the executor without a binding.
    UnboundKey(char),
    /// The source path has no file name component.
    MissingFileName(PathBuf),
    /// Destination name collision under the halt policy.
    DuplicateHalt { path: PathBuf },
    /// The destination is the displayed file itself.
    SameFile { path: PathBuf },
    /// The stale destination file could not be removed.
    OverwriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Copying the bytes or file times failed.
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The copy is in place but the original could not be removed.
    SourceRemovalFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SieveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundKey(key) => {
                write!(f, "No destination is bound to key '{}'", key)
            }
            Self::MissingFileName(path) => {
                write!(f, "Path has no file name: {}", path.display())
            }
            Self::DuplicateHalt { path } => {
                write!(
                    f,
                    "Destination already exists, halting: {}",
                    path.display()
                )
            }
            Self::SameFile { path } => {
                write!(f, "Source and destination are the same file: {}", path.display())
            }
            Self::OverwriteFailed { path, source } => {
                write!(f, "Failed to overwrite {}: {}", path.display(), source)
            }
            Self::CopyFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::SourceRemovalFailed { path, source } => {
                write!(
                    f,
                    "Copied but could not remove original {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for SieveError {}

/// Result type for sort actions.
pub type SieveResult<T> = Result<T, SieveError>;

/// Applies sort actions according to an [`InstanceConfig`].
pub struct Sieve<'a> {
    config: &'a InstanceConfig,
}

impl<'a> Sieve<'a> {
    pub fn new(config: &'a InstanceConfig) -> Self {
        Self { config }
    }

    /// Copies or moves `current` into the destination bound to `key`.
    ///
    /// Steps:
    /// 1. Look up the destination for `key`
    /// 2. Build the candidate path from the destination and the file name
    /// 3. On collision, refuse to touch the displayed file itself, then apply
    ///    the duplicate policy (may skip or halt)
    /// 4. Copy bytes, permissions and file times
    /// 5. In move mode, remove the original
    ///
    /// There is no rollback: if step 5 fails both copies remain and
    /// `SieveError::SourceRemovalFailed` is returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use visieve::config::{Binding, DisplaySize, DuplicateMode, InstanceConfig, SieveMode};
    /// use visieve::sieve::Sieve;
    /// use std::path::Path;
    ///
    /// let config = InstanceConfig::new(
    ///     "/photos/inbox",
    ///     vec![Binding::new("a", "/photos/keep").unwrap()],
    ///     SieveMode::Move,
    ///     DuplicateMode::AssignUniqueName,
    ///     DisplaySize::default(),
    /// );
    /// let outcome = Sieve::new(&config).apply(Path::new("/photos/inbox/cat.jpg"), 'a');
    /// ```
    pub fn apply(&self, current: &Path, key: char) -> SieveResult<SieveOutcome> {
        let destination_dir = self
            .config
            .destination(key)
            .ok_or(SieveError::UnboundKey(key))?;

        let file_name = current
            .file_name()
            .ok_or_else(|| SieveError::MissingFileName(current.to_path_buf()))?;

        let mut destination = destination_dir.join(file_name);

        if destination.exists() {
            if is_same_file(current, &destination) {
                return Err(SieveError::SameFile { path: destination });
            }
            match duplicate::resolve(&destination, self.config.duplicate_mode())? {
                Resolution::Write(path) => destination = path,
                Resolution::Skip => {
                    return Ok(SieveOutcome::Kept {
                        source: current.to_path_buf(),
                        existing: destination,
                    });
                }
            }
        }

        copy_with_times(current, &destination)?;

        let mode = self.config.sieve_mode();
        if mode == SieveMode::Move {
            fs::remove_file(current).map_err(|e| SieveError::SourceRemovalFailed {
                path: current.to_path_buf(),
                source: e,
            })?;
        }

        Ok(SieveOutcome::Sorted(Operation {
            source: current.to_path_buf(),
            destination,
            key,
            mode,
        }))
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copies the file contents and permissions, then carries over access and
/// modification times.
fn copy_with_times(source: &Path, destination: &Path) -> SieveResult<()> {
    let copy_error = |e: std::io::Error| SieveError::CopyFailed {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };

    let metadata = fs::metadata(source).map_err(copy_error)?;
    fs::copy(source, destination).map_err(copy_error)?;

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(destination, accessed, modified).map_err(copy_error)?;

    Ok(())
}
