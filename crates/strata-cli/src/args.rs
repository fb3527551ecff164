//! Command-line argument definitions for the Strata CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the graph and hierarchy inputs, what to
//! hide, how to lay the graph out, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Strata graph tool
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input graph file
    #[arg(help = "Path to the graph JSON file ({\"nodes\": [..], \"edges\": [..]})")]
    pub input: String,

    /// Path to the output snapshot, `-` for stdout
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// Path to a hierarchy document (JSON)
    #[arg(long)]
    pub hierarchies: Option<String>,

    /// Hierarchy to activate; defaults to the first one in the document
    #[arg(long, requires = "hierarchies")]
    pub hierarchy: Option<String>,

    /// Node ids to hide (repeatable)
    #[arg(long = "hide", value_name = "NODE_ID")]
    pub hidden: Vec<String>,

    /// Assign a node to a level of the active hierarchy (repeatable)
    #[arg(long, value_name = "NODE_ID=LEVEL_ID", requires = "hierarchies")]
    pub assign: Vec<String>,

    /// Layout algorithm (layered, force, grid); overrides the configuration
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Band nodes by their level in the active hierarchy
    #[arg(long)]
    pub respect_hierarchy: bool,

    /// Include the context menu of this node in the snapshot
    #[arg(long, value_name = "NODE_ID")]
    pub menu_for: Option<String>,

    /// Fail instead of falling back when the layout algorithm fails
    #[arg(long)]
    pub strict: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
