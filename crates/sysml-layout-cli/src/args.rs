//! Command-line argument definitions for the SysML layout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the diagram kind override and logging verbosity.

use clap::Parser;

/// Command-line arguments for the SysML layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input graph (JSON)
    #[arg(help = "Path to the input graph file")]
    pub input: String,

    /// Path to the output layout document (JSON)
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Lay the graph out as this diagram kind instead of the one it declares
    /// (bdd, ibd, activity, sequence, requirements)
    #[arg(short, long)]
    pub diagram: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
