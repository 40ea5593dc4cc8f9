use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "paperstack",
    bin_name = "paperstack",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Scanned paper documents, kept in order", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Directory holding the documents
    #[arg(long, global = true, help_heading = "Options")]
    pub workdir: Option<PathBuf>,

    /// Print listings as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store image files as scanned pages
    #[command(display_order = 1)]
    Scan {
        /// Image files, one page each, in feeder order
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Append to this document instead of creating a new one
        #[arg(long, short)]
        document: Option<String>,

        /// Store pages without orientation detection or text
        #[arg(long)]
        no_ocr: bool,

        /// Resolution of the images in DPI (defaults to the configured scanner resolution)
        #[arg(long)]
        resolution: Option<u32>,
    },

    /// List documents
    #[command(alias = "ls", display_order = 2)]
    Docs,

    /// List the pages of a document
    #[command(display_order = 3)]
    Pages { document: String },

    /// Print the recognized text of pages (all pages when none given)
    #[command(display_order = 4)]
    Text {
        document: String,
        #[arg(num_args = 0..)]
        pages: Vec<usize>,
    },

    /// Move a page to another position in its document
    #[command(alias = "mv", display_order = 5)]
    Move {
        document: String,
        page: usize,
        to: usize,
    },

    /// Delete a page; the document goes away with its last page
    #[command(alias = "rm", display_order = 6)]
    Delete { document: String, page: usize },

    /// Append a page to another document
    #[command(display_order = 7)]
    Transfer {
        document: String,
        page: usize,
        destination: String,
    },

    /// Run text recognition again on pages (all pages when none given)
    #[command(display_order = 8)]
    RedoOcr {
        document: String,
        #[arg(num_args = 0..)]
        pages: Vec<usize>,
    },

    /// Refresh a page thumbnail and print its path
    #[command(display_order = 9)]
    Thumbnail {
        document: String,
        page: usize,

        /// Width in pixels (defaults to the configured thumbnail width)
        #[arg(long, short)]
        width: Option<u32>,
    },
}
