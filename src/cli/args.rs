//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Browse a lazily loaded location tree and relocate assets
#[derive(Parser, Debug)]
#[command(name = "locpick")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Location fixture (overrides `fixture` from config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub fixture: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the location tree after expanding the given branches
    Tree {
        /// Branch to expand, in order (parents before children)
        #[arg(short, long = "expand", value_name = "ID")]
        expand: Vec<String>,
        /// Asset shown in the tree header
        #[arg(short, long, default_value = "unassigned")]
        asset: String,
    },

    /// Move an asset to a leaf location
    Relocate {
        /// Asset to relocate
        #[arg(short, long)]
        asset: String,
        /// Slash-separated location path; segments match id or label
        #[arg(short, long)]
        path: String,
        /// Reason for the move
        #[arg(short = 'm', long)]
        justification: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
