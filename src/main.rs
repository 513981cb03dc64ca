use clap::Parser;
use std::process;
use visieve::cli::{Cli, run_cli};
use visieve::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(&cli) {
        OutputFormatter::error(&e);
        process::exit(1);
    }
}
