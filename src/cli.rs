use clap::{Parser, Subcommand};
use pdfmix::commands::merge::MergeInput;
use pdfmix::rotation::Rotation;
use pdfmix::validation::MAX_FILE_SIZE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfmix")]
#[command(about = "Merge PDFs and images, and extract or rotate pages, with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Largest accepted input file, in bytes
    #[arg(long, global = true, default_value_t = MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Don't print progress
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display PDF metadata and page rotations
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Check a page range against a PDF and print the selected pages
    Pages {
        /// PDF file the range refers to
        path: PathBuf,

        /// Page ranges (e.g., "1-3, 5, 8-10")
        pages: String,
    },

    /// Combine PDFs and images into one PDF
    Merge {
        /// Files to merge, in order; append @90, @180 or @270 to rotate one
        #[arg(required = true)]
        inputs: Vec<MergeInput>,

        /// Output file (".pdf" is added if missing)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Extract selected pages into a new PDF
    #[command(alias = "extract")]
    Split {
        /// PDF file to extract from
        path: PathBuf,

        /// Page ranges (e.g., "1-3, 5, 8-10")
        pages: String,

        /// Output file (".pdf" is added if missing)
        #[arg(short, long)]
        output: Option<String>,

        /// Rotate every extracted page by this many degrees
        #[arg(long, conflicts_with = "rotations")]
        rotate: Option<Rotation>,

        /// Per-page rotations, comma-separated, one per selected page
        #[arg(long, value_delimiter = ',')]
        rotations: Option<Vec<Rotation>>,
    },
}
