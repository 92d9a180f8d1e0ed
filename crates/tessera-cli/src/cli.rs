//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tessera_core::LocalDocumentId;

/// Tessera - inspect document flattening and primary keys
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about, long_about = None)]
pub struct Cli {
    /// Analyzer definitions: a JSON object mapping names to
    /// `{ "type": ..., "properties": ..., "features": [...] }`
    #[arg(short, long, global = true, env = "TESSERA_ANALYZERS")]
    pub analyzers: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the fields a document produces
    Fields {
        /// Link configuration (JSON); defaults to indexing every field
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Document to flatten (JSON object)
        document: PathBuf,

        /// Also print each field's terms
        #[arg(short, long)]
        terms: bool,
    },

    /// Primary key operations
    Pk {
        /// Action to perform
        #[command(subcommand)]
        action: PkAction,
    },
}

/// Primary key subcommands.
#[derive(Subcommand, Debug)]
pub enum PkAction {
    /// Print the hex-encoded key of a document identifier
    Encode {
        /// Local document identifier
        id: LocalDocumentId,
    },

    /// Print the document identifier of a hex-encoded key
    Decode {
        /// Hex-encoded key (16 digits)
        key: String,
    },
}
