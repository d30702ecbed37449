//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line arguments,
//! and a `Commands` enum that represents the available subcommands and their
//! options.

use clap::{Parser, Subcommand};

/// Represents the parsed command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// The 'ask' subcommand: turn a natural-language question into SQL.
    #[clap(name = "ask", alias = "a")]
    Ask {
        /// The natural-language question to translate.
        question: String,

        /// Override the schema description path from the config file.
        #[arg(name = "schema", short = 's', long = "schema")]
        schema: Option<String>,

        /// Print the retrieved schema context alongside the SQL.
        #[arg(long = "show-context")]
        show_context: bool,
    },

    /// The 'init' subcommand, which takes no arguments and is used for
    /// initialization.
    ///
    /// When invoked, this subcommand writes a starter config file and a
    /// sample schema description into the configuration directory.
    Init,
}
