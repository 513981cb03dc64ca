//! visieve - sort images into folders, one key press at a time
//!
//! This library provides the binding configuration, the image source
//! iterator, the copy/move executor with its duplicate-name policies, a
//! toolkit-independent sorting session and a terminal front end for it.

pub mod cli;
pub mod config;
pub mod duplicate;
pub mod output;
pub mod session;
pub mod sieve;
pub mod source;
pub mod terminal;

pub use config::{
    Binding, BindingFile, ConfigError, DisplaySize, DuplicateMode, InstanceConfig, SieveMode,
    ValidationError,
};
pub use session::{Action, Key, Session};
pub use sieve::{Operation, Sieve, SieveError, SieveOutcome};
pub use source::{SourceImage, SourceImages};

pub use cli::{Cli, run_cli};
