//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;

pub mod shell;

pub use shell::{parse_shell_command, ShellCommand, SHELL_HELP};

/// Quote Keeper - keep, filter, export and sync a list of quotes.
#[derive(Parser, Debug)]
#[command(name = "quote-keeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: text, json, or table.
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,

    /// Use this config file instead of ~/.quote-keeper/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the remote sync endpoint.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a random quote from the selected category.
    Show {
        /// Avoid repeating the last shown quote.
        #[arg(long)]
        fresh: bool,
    },

    /// Add a new quote.
    Add {
        /// Quote text.
        text: String,

        /// Quote category.
        category: String,

        /// Sync with the remote right after adding.
        #[arg(long)]
        sync: bool,
    },

    /// List quotes in the selected category.
    List,

    /// List categories, marking the selected one.
    Categories,

    /// Select the category used by `show` and `list` ("all" resets).
    Filter {
        /// Category name.
        category: String,
    },

    /// Export all quotes as JSON.
    Export {
        /// Output file path.
        #[arg(short, long, default_value = "quotes.json")]
        output: PathBuf,

        /// Print to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Import quotes from a JSON file.
    Import {
        /// File containing a JSON array of {text, category} objects.
        file: PathBuf,
    },

    /// Sync once with the remote endpoint.
    Sync,

    /// Sync periodically until interrupted.
    Watch,

    /// Show store and sync status.
    Status,

    /// Show or write configuration.
    Config {
        /// Write the default config file if missing.
        #[arg(long)]
        init: bool,

        /// Save the effective configuration (including overrides).
        #[arg(long, conflicts_with = "init")]
        save: bool,
    },

    /// Interactive session with background sync.
    Shell,
}

impl Cli {
    /// Parse the output format argument.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}
