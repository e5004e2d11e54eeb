//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::EntityRef;

/// Catalogue hierarchy builder: flat parent-referencing records to navigable forests
#[derive(Parser, Debug)]
#[command(name = "taxon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d, -dd, -ddd)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Reject duplicate, dangling and cyclic parent references
    #[arg(long, global = true)]
    pub strict: bool,

    /// Catalog mirror directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub catalog_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show hierarchies as trees
    Tree {
        /// Records file (JSON array or TOML `records`)
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Locate one node and show its ancestry and children
    Find {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Identifier of the node
        id: String,
    },

    /// List leaf nodes
    Leaves {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show all branches linearly, leaf first
    Branches {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Report dangling, cyclic and duplicate records
    Orphans {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Validate records strictly
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Write hierarchies as nested JSON
    Export {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Pretty-print
        #[arg(short, long)]
        pretty: bool,
    },

    /// Select a node interactively (fzf)
    Select {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Summarize the data-type view of the catalog
    View,

    /// Show measurable hierarchies from the catalog
    Measurables {
        /// Only measurables related to this entity, e.g. APPLICATION/12
        #[arg(long)]
        related: Option<EntityRef>,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
