//! Output formatting and styling module.
//!
//! Provides a centralized interface for all console output: colored status
//! lines, per-operation reports and the end-of-session summary table. The
//! sorting window runs in raw mode, so nothing here may be called while it
//! is open.

use crate::config::InstanceConfig;
use crate::sieve::Operation;
use colored::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all console output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Operation reports and summary tables
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use visieve::output::OutputFormatter;
    /// OutputFormatter::success("Done. Thanks for using visieve!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints one line per completed operation, e.g.
    /// `Copied inbox/cat.jpg into keep/cat.jpg`.
    pub fn operation(operation: &Operation) {
        println!(
            "  {} {} {} into {}",
            format!("[{}]", operation.key).bold(),
            operation.mode.past_tense(),
            operation.source.display(),
            operation.destination.display()
        );
    }

    /// Prints the key/destination legend of a configuration.
    pub fn bindings(config: &InstanceConfig) {
        Self::header("BINDINGS");
        for (key, destination) in config.destinations() {
            println!("  {}  {}", key.to_string().bold(), destination.display());
        }
    }

    /// Prints a summary table with file counts per destination.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use visieve::output::OutputFormatter;
    ///
    /// OutputFormatter::summary_table(&[]);
    /// ```
    pub fn summary_table(operations: &[Operation]) {
        Self::header("SUMMARY");

        let mut counts: BTreeMap<(char, String), usize> = BTreeMap::new();
        for operation in operations {
            let folder = operation
                .destination
                .parent()
                .unwrap_or(Path::new(""))
                .display()
                .to_string();
            *counts.entry((operation.key, folder)).or_insert(0) += 1;
        }

        let max_folder_len = counts
            .keys()
            .map(|(_, folder)| folder.len() + 4)
            .max()
            .unwrap_or(0)
            .max(11); // At least "Destination" width

        println!(
            "{:<width$} | {}",
            "Destination".bold(),
            "Files".bold(),
            width = max_folder_len
        );
        println!("{}", "-".repeat(max_folder_len + 10));

        for ((key, folder), count) in &counts {
            let file_word = if *count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                format!("[{}] {}", key, folder),
                count.to_string().green(),
                file_word,
                width = max_folder_len
            );
        }

        let total_files = operations.len();
        println!("{}", "-".repeat(max_folder_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_folder_len
        );
    }
}
