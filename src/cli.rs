//! Command-line interface module for visieve.
//!
//! This module handles all CLI-related functionality including:
//! - Flag parsing
//! - Merging flags with the binding file
//! - Configuration validation
//! - Dry-run listing
//! - Running the sorting window and reporting what it did

use crate::config::{Binding, BindingFile, ConfigError, DuplicateMode, InstanceConfig, SieveMode};
use crate::output::OutputFormatter;
use crate::session::Session;
use crate::source::{SourceImages, list_image_files};
use crate::terminal::{SessionEnd, SortingWindow};
use clap::Parser;
use std::path::PathBuf;

/// Sort images into folders with one key press each.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "visieve", version, about)]
pub struct Cli {
    /// Directory holding the images to sort.
    #[arg(short, long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Bind a key (0-9, a-z) to a destination directory. Repeatable.
    #[arg(short = 'b', long = "bind", value_name = "KEY=DIR")]
    pub bindings: Vec<Binding>,

    /// Copy files, or move them out of the source directory.
    #[arg(short, long, value_enum)]
    pub mode: Option<SieveMode>,

    /// What to do when the destination already holds a file with the same name.
    #[arg(short, long, value_enum)]
    pub duplicates: Option<DuplicateMode>,

    /// Preview width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Preview height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Binding file to load instead of the default locations.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List the images that would be shown and exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Builds the session configuration from the binding file and the flags.
    ///
    /// Flags win over the file. Returns `Ok(None)` if no source directory is
    /// known after merging.
    ///
    /// # Errors
    ///
    /// Returns an error if the binding file cannot be loaded or holds an
    /// invalid key.
    pub fn resolve_config(&self) -> Result<Option<InstanceConfig>, ConfigError> {
        let file = BindingFile::load(self.config.as_deref())?;

        let mut flags = BindingFile {
            source: self.source.clone(),
            mode: self.mode,
            duplicates: self.duplicates,
            ..Default::default()
        };
        for binding in &self.bindings {
            flags
                .bindings
                .insert(binding.key.to_string(), binding.destination.clone());
        }

        let mut merged = file.overlay(flags);
        if self.width.is_some() || self.height.is_some() {
            let mut size = merged.display.unwrap_or_default();
            if let Some(width) = self.width {
                size.width = width;
            }
            if let Some(height) = self.height {
                size.height = height;
            }
            merged.display = Some(size);
        }

        merged.into_config()
    }
}

/// Runs visieve with the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use visieve::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["visieve", "--source", "inbox", "--bind", "a=keep"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let config = cli
        .resolve_config()
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    let Some(config) = config else {
        OutputFormatter::warning("Configuration object not found. Quitting...");
        return Ok(());
    };

    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    if cli.dry_run {
        sieve_directory_dry_run(&config)
    } else {
        sieve_directory(&config)
    }
}

/// Opens the sorting window over the source directory.
///
/// This function:
/// 1. Lists the source images, newest first
/// 2. Runs the sorting window until the images run out or the user quits
/// 3. Prints every operation performed and a summary per destination
///
/// Operations performed before a fatal error are still reported.
pub fn sieve_directory(config: &InstanceConfig) -> Result<(), String> {
    let images = SourceImages::open(config.source(), config.size().width).map_err(|e| {
        format!(
            "Error reading directory {}: {}",
            config.source().display(),
            e
        )
    })?;

    OutputFormatter::info(&format!(
        "Beginning the sieving process: {} candidate images in {}",
        images.remaining(),
        config.source().display()
    ));

    let mut session = Session::new(config, images);
    let result = SortingWindow::new(&mut session).run();

    let operations = session.into_operations();
    if !operations.is_empty() {
        OutputFormatter::header("OPERATIONS");
        for operation in &operations {
            OutputFormatter::operation(operation);
        }
        OutputFormatter::summary_table(&operations);
    }

    match result {
        Ok(SessionEnd::Exhausted) => {
            OutputFormatter::info("Reached end of file set");
            OutputFormatter::success("Done. Thanks for using visieve!");
            Ok(())
        }
        Ok(SessionEnd::Quit) => {
            OutputFormatter::warning("Session ended before all images were sorted.");
            Ok(())
        }
        Err(e) => Err(format!("Sieving stopped: {}", e)),
    }
}

/// Shows what a session would present without opening the window.
///
/// This function:
/// 1. Prints the sieve and duplicate modes and the bindings
/// 2. Lists the candidate images in display order
/// 3. Leaves every file untouched
pub fn sieve_directory_dry_run(config: &InstanceConfig) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Sieving {} (mode: {}, duplicates: {})",
        config.source().display(),
        config.sieve_mode(),
        config.duplicate_mode()
    ));
    OutputFormatter::bindings(config);

    let files = list_image_files(config.source()).map_err(|e| {
        format!(
            "Error reading directory {}: {}",
            config.source().display(),
            e
        )
    })?;

    if files.is_empty() {
        OutputFormatter::plain("No images found to sieve.");
        return Ok(());
    }

    OutputFormatter::header("IMAGES (newest first)");
    for (index, path) in files.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        OutputFormatter::plain(&format!("  {:>4}. {}", index + 1, name));
    }

    OutputFormatter::plain(&format!("\nTotal images: {}", files.len()));
    OutputFormatter::success("Dry run complete. No files were modified.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("visieve").chain(args.iter().copied()))
            .expect("Failed to parse arguments")
    }

    #[test]
    fn test_parse_flags() {
        let cli = parse(&[
            "-s",
            "/tmp/in",
            "-b",
            "a=/tmp/keep",
            "--bind",
            "S=/tmp/trash",
            "--mode",
            "move",
            "--duplicates",
            "unique",
            "--width",
            "640",
        ]);

        assert_eq!(cli.source, Some(PathBuf::from("/tmp/in")));
        assert_eq!(cli.bindings.len(), 2);
        assert_eq!(cli.bindings[1].key, 's');
        assert_eq!(cli.mode, Some(SieveMode::Move));
        assert_eq!(cli.duplicates, Some(DuplicateMode::AssignUniqueName));
        assert_eq!(cli.width, Some(640));
    }

    #[test]
    fn test_parse_rejects_bad_binding() {
        let result = Cli::try_parse_from(["visieve", "--bind", "ab=/tmp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let result = Cli::try_parse_from(["visieve", "--mode", "invalid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("visieve.toml");
        fs::write(
            &file,
            r#"
            source = "/tmp/from-file"
            mode = "move"
            [display]
            width = 320
            height = 200
            [bindings]
            a = "/tmp/a"
            "#,
        )
        .expect("Failed to write config");

        let mut cli = parse(&["--bind", "b=/tmp/b", "--height", "100"]);
        cli.config = Some(file);
        let config = cli.resolve_config().unwrap().unwrap();

        assert_eq!(config.source(), std::path::Path::new("/tmp/from-file"));
        assert_eq!(config.sieve_mode(), SieveMode::Move);
        assert_eq!(config.destinations().len(), 2);
        assert_eq!(config.size().width, 320);
        assert_eq!(config.size().height, 100);
    }

    #[test]
    fn test_resolve_config_rejects_bad_key_in_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("visieve.toml");
        fs::write(&file, "source = \"/tmp\"\n[bindings]\n\"!\" = \"/tmp\"\n")
            .expect("Failed to write config");

        let cli = Cli {
            config: Some(file),
            ..Default::default()
        };

        assert!(matches!(
            cli.resolve_config(),
            Err(ConfigError::InvalidKey(_))
        ));
    }
}
