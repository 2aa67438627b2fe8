use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "rig", version, about = "Repository Intelligence Graph extractor")]
pub struct Cli {
    /// Emit a single structured JSON document on stdout instead of
    /// human-readable colored text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the full extraction pipeline and persist the result.
    Extract {
        /// Path to the repository root.
        repo: PathBuf,

        /// Path to the configured build directory.
        build: PathBuf,

        /// Database path to write the RIG into.
        #[arg(long, default_value = "./rig.sqlite3")]
        db: PathBuf,

        /// Build-system plugin to use. Only `cmake` exists today; the flag
        /// is reserved for future non-reference plugins.
        #[arg(long, default_value = "cmake")]
        plugin: String,
    },

    /// Read back a persisted RIG without re-running extraction.
    Inspect {
        #[arg(long)]
        db: PathBuf,

        /// Print entity-count summary (the default view).
        #[arg(long)]
        summary: bool,

        /// Print one component's detail by name.
        #[arg(long)]
        component: Option<String>,
    },

    /// Check that the tools a build-system plugin needs are on `PATH`.
    Doctor,
}
