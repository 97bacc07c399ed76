use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Extract bordered tables from a PDF document as CSV.
#[derive(Debug, Parser)]
#[command(name = "pdf2csv", about, version)]
pub struct Cli {
    /// Path to the PDF file
    #[arg(value_name = "PDF")]
    pub pdf: PathBuf,

    /// Pages to extract: 'N', 'N-M', 'N-' or '-M' (1-based, inclusive). Default: all pages
    #[arg(short = 'p', long)]
    pub page_range: Option<String>,

    /// Distance within which border lines are treated as one, in PDF points
    #[arg(short = 'b', long, default_value_t = pdf2csv::DEFAULT_BORDER_WIDTH)]
    pub border_width: f64,

    /// Write a debug SVG per page; '%d' (or '%04d') is replaced by the page number
    #[arg(long, value_name = "PATH")]
    pub debug_dump_svg_path: Option<String>,

    /// Write CSV to this file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity (repeatable)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Process pages concurrently
    #[arg(short = 'j', long)]
    pub parallel: bool,
}
