pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bindery",
    version,
    about = "Convert an aggregated HTML book into a multi-chapter EPUB"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an HTML file into an EPUB
    Convert {
        /// Path to the aggregated HTML file
        input: PathBuf,
        /// Output EPUB file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Cover image to embed
        #[arg(long)]
        cover: Option<PathBuf>,
        /// metadata.yml overriding the built-in book metadata
        #[arg(long)]
        meta: Option<PathBuf>,
        /// Also write fetched images to this directory
        #[arg(long)]
        image_dir: Option<PathBuf>,
        /// Pin the dcterms:modified timestamp (ISO-8601 UTC)
        #[arg(long)]
        modified: Option<String>,
    },
    /// List the chapters an HTML file would produce, without converting
    Inspect {
        /// Path to the aggregated HTML file
        input: PathBuf,
    },
    /// Check the structure of an EPUB file
    Validate {
        /// Path to the EPUB file
        file: PathBuf,
    },
}
