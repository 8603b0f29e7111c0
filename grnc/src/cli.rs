//! # CLI
//!
//! This module defines the command-line interface of `grnc` using `clap`.
//!
//! It is responsible for parsing user input; all actual work happens in `main.rs`.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grnc", version, about = "Groonga grntest fixture tooling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert grntest fixture pairs into Rust test source
    ///
    /// Each request file (`NAME.test`) is paired with its expected-output twin
    /// (`NAME.expected`, next to it). A parse failure aborts only the file it
    /// occurs in; an unreconcilable pair is skipped with a warning. Either way the
    /// remaining files are still converted.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// grnc convert suite/select.test suite/load.test --output-dir tests/generated
    /// ```
    Convert {
        /// The request fixture files
        #[arg(required = true)]
        requests: Vec<PathBuf>,
        /// Directory for the generated `.rs` files (stdout when omitted)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Parse one fixture file and dump its element structure
    Inspect {
        /// The fixture file to parse
        fixture: PathBuf,
    },
}
