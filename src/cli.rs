//! Command-Line Interface

use clap::Parser;
use negtrack_core::Variant;
use std::path::PathBuf;

/// Word-by-word sentence verification with mouse tracking
#[derive(Parser, Debug)]
#[command(name = "negtrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Built-in stimulus set: no-context or context
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Seed for the trial order, trial types and button layout
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write the session result
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TrueType/OpenType font used for all text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Show the instructions without allowing the session to start
    #[arg(long)]
    pub preview: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,
}
