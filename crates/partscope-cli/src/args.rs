//! Command-line argument definitions for the Partscope CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Every invocation names a model file and one [`Command`];
//! configuration file selection and logging verbosity apply to all commands.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Partscope model tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input model file
    #[arg(help = "Path to the input model file")]
    pub input: String,

    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export the comments of every part to CSV
    Comments {
        /// Output CSV file; standard output if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Export the documentation of every part to CSV
    Docs {
        /// Output CSV file; standard output if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List parts lacking documentation in the configured locales
    Locales,

    /// Evaluate features of an element
    Eval {
        /// Element owning the feature, by name or qualified name
        #[arg(short, long)]
        element: String,

        /// Feature to evaluate
        #[arg(short, long, required_unless_present = "all")]
        feature: Option<String>,

        /// Element to evaluate in; defaults to the owning element
        #[arg(short, long)]
        scope: Option<String>,

        /// Evaluate every feature visible in the element
        #[arg(long, conflicts_with_all = ["feature", "scope"])]
        all: bool,
    },
}
