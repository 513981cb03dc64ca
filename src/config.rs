//! Binding configuration for a sieving session.
//!
//! This module owns the immutable [`InstanceConfig`] consumed by the sorting
//! loop, the policy enums it carries, and the TOML binding file that can
//! pre-fill it. Bindings can also be given on the command line; see
//! [`BindingFile::overlay`] for how the two sources are merged.
//!
//! # Binding File Format
//!
//! ```toml
//! source = "/home/user/Pictures/inbox"
//! mode = "move"                       # copy | move
//! duplicates = "assign-unique-name"   # maintain | overwrite | assign-unique-name | halt
//!
//! [display]
//! width = 800
//! height = 600
//!
//! [bindings]
//! a = "/home/user/Pictures/keep"
//! s = "/home/user/Pictures/maybe"
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Keys that may be bound to a destination.
pub const ACCEPTED_KEYS: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Errors that can occur while loading or parsing a binding configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Binding file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A key that is not a single character from [`ACCEPTED_KEYS`].
    InvalidKey(String),
    /// A `KEY=DIR` binding that could not be split.
    InvalidBinding(String),
    /// Two binding keys fold to the same key.
    DuplicateKey(char),
    /// IO error while reading the binding file.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Binding file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid binding file: {}", msg),
            ConfigError::InvalidKey(key) => {
                write!(f, "Invalid key '{}': expected one of 0-9 or a-z", key)
            }
            ConfigError::InvalidBinding(raw) => {
                write!(f, "Invalid binding '{}': expected KEY=DIR", raw)
            }
            ConfigError::DuplicateKey(key) => {
                write!(f, "Key '{}' is bound more than once", key)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading binding file: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Whether a triage action duplicates or relocates the source file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SieveMode {
    /// Leave the original in the source directory.
    #[default]
    Copy,
    /// Remove the original once the copy is in place.
    Move,
}

impl SieveMode {
    /// Past-tense verb used when reporting an operation.
    pub fn past_tense(&self) -> &'static str {
        match self {
            SieveMode::Copy => "Copied",
            SieveMode::Move => "Moved",
        }
    }
}

impl std::fmt::Display for SieveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SieveMode::Copy => write!(f, "copy"),
            SieveMode::Move => write!(f, "move"),
        }
    }
}

/// Policy applied when the destination file name is already taken.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateMode {
    /// Keep the existing file and skip the write.
    #[default]
    Maintain,
    /// Delete the existing file, then write.
    Overwrite,
    /// Write to `name(n).ext` for the smallest free `n`.
    #[serde(alias = "unique")]
    #[value(alias = "unique")]
    AssignUniqueName,
    /// Abort the session on the first collision.
    Halt,
}

impl std::fmt::Display for DuplicateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateMode::Maintain => write!(f, "maintain"),
            DuplicateMode::Overwrite => write!(f, "overwrite"),
            DuplicateMode::AssignUniqueName => write!(f, "assign-unique-name"),
            DuplicateMode::Halt => write!(f, "halt"),
        }
    }
}

/// Preview size in pixels. The width drives rescaling of each image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// A single key bound to a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: char,
    pub destination: PathBuf,
}

impl Binding {
    /// Creates a binding, validating the key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKey` unless `key` is exactly one
    /// character from [`ACCEPTED_KEYS`] (upper-case letters are folded).
    pub fn new(key: &str, destination: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            key: parse_key(key)?,
            destination: destination.into(),
        })
    }
}

impl FromStr for Binding {
    type Err = ConfigError;

    /// Parses `KEY=DIR`, e.g. `a=/home/user/keep`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (key, destination) = raw
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidBinding(raw.to_string()))?;
        if destination.trim().is_empty() {
            return Err(ConfigError::InvalidBinding(raw.to_string()));
        }
        Binding::new(key, destination.trim())
    }
}

/// Validates a raw key string and folds it to lower case.
pub fn parse_key(raw: &str) -> Result<char, ConfigError> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            let key = c.to_ascii_lowercase();
            if ACCEPTED_KEYS.contains(key) {
                Ok(key)
            } else {
                Err(ConfigError::InvalidKey(raw.to_string()))
            }
        }
        _ => Err(ConfigError::InvalidKey(raw.to_string())),
    }
}

/// Reasons an [`InstanceConfig`] cannot start a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The source directory does not exist.
    SourceMissing(PathBuf),
    /// A bound destination does not exist.
    DestinationMissing { key: char, path: PathBuf },
    /// Nothing is bound, so no key could ever sort a file.
    NoBindings,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::SourceMissing(path) => {
                write!(f, "Source directory does not exist: {}", path.display())
            }
            ValidationError::DestinationMissing { key, path } => {
                write!(
                    f,
                    "Destination for key '{}' does not exist: {}",
                    key,
                    path.display()
                )
            }
            ValidationError::NoBindings => write!(f, "No key is bound to a destination"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Immutable configuration of one sieving session.
///
/// Built once by the binding step and only read afterwards. The sieve mode
/// can only hold `Copy` or `Move`, so the remaining invariants are the ones
/// [`InstanceConfig::validate`] checks against the filesystem.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    source: PathBuf,
    destinations: BTreeMap<char, PathBuf>,
    sieve_mode: SieveMode,
    duplicate_mode: DuplicateMode,
    size: DisplaySize,
}

impl InstanceConfig {
    /// Folds the bindings into a key map. A later binding for the same key wins.
    pub fn new(
        source: impl Into<PathBuf>,
        bindings: impl IntoIterator<Item = Binding>,
        sieve_mode: SieveMode,
        duplicate_mode: DuplicateMode,
        size: DisplaySize,
    ) -> Self {
        let destinations = bindings
            .into_iter()
            .map(|binding| (binding.key, binding.destination))
            .collect();
        Self {
            source: source.into(),
            destinations,
            sieve_mode,
            duplicate_mode,
            size,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// All bindings, ordered by key.
    pub fn destinations(&self) -> &BTreeMap<char, PathBuf> {
        &self.destinations
    }

    pub fn destination(&self, key: char) -> Option<&Path> {
        self.destinations.get(&key).map(PathBuf::as_path)
    }

    pub fn sieve_mode(&self) -> SieveMode {
        self.sieve_mode
    }

    pub fn duplicate_mode(&self) -> DuplicateMode {
        self.duplicate_mode
    }

    pub fn size(&self) -> DisplaySize {
        self.size
    }

    /// Checks the configuration against the filesystem.
    ///
    /// Checks run in this order and the first failure is returned:
    /// 1. Source directory exists
    /// 2. Every destination exists (in key order)
    /// 3. At least one key is bound
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] for the first failing check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.source.exists() {
            return Err(ValidationError::SourceMissing(self.source.clone()));
        }

        if let Some((key, path)) = self.destinations.iter().find(|(_, path)| !path.exists()) {
            return Err(ValidationError::DestinationMissing {
                key: *key,
                path: path.clone(),
            });
        }

        if self.destinations.is_empty() {
            return Err(ValidationError::NoBindings);
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Partial configuration as read from a TOML binding file or built from
/// command-line flags. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingFile {
    pub source: Option<PathBuf>,
    pub mode: Option<SieveMode>,
    pub duplicates: Option<DuplicateMode>,
    pub display: Option<DisplaySize>,
    #[serde(default)]
    pub bindings: BTreeMap<String, PathBuf>,
}

impl BindingFile {
    /// Load a binding file, with fallback to an empty one.
    ///
    /// Attempts to load in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.visieverc.toml` in the current directory
    /// 3. Look for `~/.config/visieve/config.toml` in home directory
    /// 4. Fall back to an empty binding file
    ///
    /// # Errors
    ///
    /// Returns an error if a file is explicitly provided but cannot be read,
    /// or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".visieverc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("visieve")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load a binding file from a specific path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::IoError` if it cannot be read and
    /// `ConfigError::ConfigInvalid` if TOML parsing fails.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Lays `other` on top of `self`: every value set in `other` wins, and
    /// its bindings replace bindings for the same key.
    pub fn overlay(mut self, other: BindingFile) -> Self {
        self.source = other.source.or(self.source);
        self.mode = other.mode.or(self.mode);
        self.duplicates = other.duplicates.or(self.duplicates);
        self.display = other.display.or(self.display);
        self.bindings.extend(other.bindings);
        self
    }

    /// Produces the session configuration.
    ///
    /// Returns `Ok(None)` when no source directory was given, which the
    /// caller treats as the user backing out of the binding step.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKey` if any binding key is not accepted,
    /// and `ConfigError::DuplicateKey` if two keys fold to the same letter.
    pub fn into_config(self) -> Result<Option<InstanceConfig>, ConfigError> {
        let Some(source) = self.source else {
            return Ok(None);
        };

        let mut bindings = Vec::with_capacity(self.bindings.len());
        let mut seen = BTreeSet::new();
        for (raw, destination) in self.bindings {
            let binding = Binding::new(&raw, destination)?;
            if !seen.insert(binding.key) {
                return Err(ConfigError::DuplicateKey(binding.key));
            }
            bindings.push(binding);
        }

        Ok(Some(InstanceConfig::new(
            source,
            bindings,
            self.mode.unwrap_or_default(),
            self.duplicates.unwrap_or_default(),
            self.display.unwrap_or_default(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_key_accepts_digits_and_letters() {
        assert_eq!(parse_key("a").unwrap(), 'a');
        assert_eq!(parse_key("7").unwrap(), '7');
        assert_eq!(parse_key("Q").unwrap(), 'q');
    }

    #[test]
    fn test_parse_key_rejects_bad_input() {
        assert!(parse_key("").is_err());
        assert!(parse_key("ab").is_err());
        assert!(parse_key("-").is_err());
        assert!(parse_key("é").is_err());
    }

    #[test]
    fn test_binding_from_str() {
        let binding: Binding = "a=/tmp/keep".parse().unwrap();
        assert_eq!(binding.key, 'a');
        assert_eq!(binding.destination, PathBuf::from("/tmp/keep"));

        assert!("a".parse::<Binding>().is_err());
        assert!("a=".parse::<Binding>().is_err());
        assert!("ab=/tmp".parse::<Binding>().is_err());
    }

    #[test]
    fn test_parse_full_binding_file() {
        let file = BindingFile::parse(
            r#"
            source = "/tmp/inbox"
            mode = "move"
            duplicates = "unique"

            [display]
            width = 320

            [bindings]
            a = "/tmp/keep"
            s = "/tmp/trash"
            "#,
        )
        .unwrap();

        assert_eq!(file.source, Some(PathBuf::from("/tmp/inbox")));
        assert_eq!(file.mode, Some(SieveMode::Move));
        assert_eq!(file.duplicates, Some(DuplicateMode::AssignUniqueName));
        assert_eq!(
            file.display,
            Some(DisplaySize {
                width: 320,
                height: 600
            })
        );
        assert_eq!(file.bindings.len(), 2);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = BindingFile::parse(r#"mode = "invalid""#);
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = BindingFile::load(Some(Path::new("/non/existent/visieve.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_overlay_prefers_other() {
        let base = BindingFile::parse(
            r#"
            source = "/tmp/a"
            mode = "move"
            [bindings]
            a = "/tmp/one"
            b = "/tmp/two"
            "#,
        )
        .unwrap();
        let mut flags = BindingFile {
            source: Some(PathBuf::from("/tmp/b")),
            ..Default::default()
        };
        flags
            .bindings
            .insert("a".to_string(), PathBuf::from("/tmp/three"));

        let merged = base.overlay(flags);
        assert_eq!(merged.source, Some(PathBuf::from("/tmp/b")));
        assert_eq!(merged.mode, Some(SieveMode::Move));
        assert_eq!(merged.bindings["a"], PathBuf::from("/tmp/three"));
        assert_eq!(merged.bindings["b"], PathBuf::from("/tmp/two"));
    }

    #[test]
    fn test_into_config_without_source_is_absent() {
        let config = BindingFile::default().into_config().unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_into_config_applies_defaults() {
        let file = BindingFile::parse(
            r#"
            source = "/tmp/inbox"
            [bindings]
            K = "/tmp/keep"
            "#,
        )
        .unwrap();
        let config = file.into_config().unwrap().unwrap();

        assert_eq!(config.sieve_mode(), SieveMode::Copy);
        assert_eq!(config.duplicate_mode(), DuplicateMode::Maintain);
        assert_eq!(config.size(), DisplaySize::default());
        assert_eq!(config.destination('k'), Some(Path::new("/tmp/keep")));
    }

    #[test]
    fn test_into_config_rejects_keys_differing_in_case() {
        let file = BindingFile::parse(
            r#"
            source = "/tmp/inbox"
            [bindings]
            A = "/tmp/one"
            a = "/tmp/two"
            "#,
        )
        .unwrap();

        assert!(matches!(
            file.into_config(),
            Err(ConfigError::DuplicateKey('a'))
        ));
    }

    #[test]
    fn test_validate_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = InstanceConfig::new(
            temp_dir.path().join("missing"),
            vec![Binding::new("a", temp_dir.path()).unwrap()],
            SieveMode::Copy,
            DuplicateMode::Maintain,
            DisplaySize::default(),
        );

        assert!(matches!(
            config.validate(),
            Err(ValidationError::SourceMissing(_))
        ));
        assert!(!config.is_valid());
    }

    #[test]
    fn test_validate_missing_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nowhere");
        let config = InstanceConfig::new(
            temp_dir.path(),
            vec![
                Binding::new("a", temp_dir.path()).unwrap(),
                Binding::new("b", &missing).unwrap(),
            ],
            SieveMode::Move,
            DuplicateMode::Maintain,
            DisplaySize::default(),
        );

        assert_eq!(
            config.validate(),
            Err(ValidationError::DestinationMissing {
                key: 'b',
                path: missing
            })
        );
    }

    #[test]
    fn test_validate_source_checked_before_destinations() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = InstanceConfig::new(
            temp_dir.path().join("missing-source"),
            vec![Binding::new("a", temp_dir.path().join("missing-dest")).unwrap()],
            SieveMode::Copy,
            DuplicateMode::Maintain,
            DisplaySize::default(),
        );

        assert!(matches!(
            config.validate(),
            Err(ValidationError::SourceMissing(_))
        ));
    }

    #[test]
    fn test_validate_no_bindings() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = InstanceConfig::new(
            temp_dir.path(),
            Vec::new(),
            SieveMode::Copy,
            DuplicateMode::Maintain,
            DisplaySize::default(),
        );

        assert_eq!(config.validate(), Err(ValidationError::NoBindings));
    }

    #[test]
    fn test_validate_ok() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = InstanceConfig::new(
            temp_dir.path(),
            vec![Binding::new("a", temp_dir.path()).unwrap()],
            SieveMode::Copy,
            DuplicateMode::Maintain,
            DisplaySize::default(),
        );

        assert!(config.is_valid());
    }
}
