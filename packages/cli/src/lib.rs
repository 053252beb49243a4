//! # nodetree-cli
//!
//! Command-line access to a NodeTree structure store on disk.
//!
//! Every command prints one JSON document on stdout. Failures are returned as
//! [`CliError`], whose [`CliError::code`] is the stable code shown to the user.
//!
//! ## Usage
//!
//! ```bash
//! nodetree --root site get page:home --summary
//! nodetree --root site add page:home 0 '{"tag": "section"}' --position inside
//! nodetree --root site move page:home 0 2 --position after
//! nodetree --root site list page
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use nodetree::{
    EditError, GuardLimits, Position, StructureId, StructureKind, DEFAULT_SUMMARY_DEPTH,
};

pub mod commands;

pub use commands::run;

/// NodeTree - edit page, menu, footer and component structures
#[derive(Parser, Debug)]
#[command(name = "nodetree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store root directory
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// JSON file with guard limits; missing fields keep their defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub limits: Option<PathBuf>,

    /// Override the maximum number of nodes in a structure
    #[arg(long, global = true)]
    pub max_nodes: Option<usize>,

    /// Override the maximum node depth
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a structure, one node, its annotated form or a summary
    Get {
        /// Structure id: page:<name>, menu, footer or component:<name>
        id: StructureId,
        /// Print only the node at this path
        #[arg(long, conflicts_with_all = ["annotate", "summary"])]
        path: Option<String>,
        /// Attach a `_nodeId` to every node
        #[arg(long, conflicts_with = "summary")]
        annotate: bool,
        /// Print a compact outline of the tree
        #[arg(long)]
        summary: bool,
        /// How deep the summary descends
        #[arg(long, default_value_t = DEFAULT_SUMMARY_DEPTH, requires = "summary")]
        depth: usize,
    },
    /// Insert a node relative to a target path, or at the top of an object root
    Add {
        id: StructureId,
        /// Node path, or "root"
        target: String,
        /// The node, as JSON
        node: String,
        #[arg(long, default_value_t = Position::After)]
        position: Position,
    },
    /// Replace the node at a path
    Edit {
        id: StructureId,
        path: String,
        node: String,
    },
    /// Delete the node at a path with its subtree
    Delete { id: StructureId, path: String },
    /// Move a node before, after or inside another
    Move {
        id: StructureId,
        source: String,
        target: String,
        #[arg(long, default_value_t = Position::After)]
        position: Position,
    },
    /// Copy a node in place, right after the original
    Duplicate { id: StructureId, path: String },
    /// Store a whole structure read from a JSON file
    Replace { id: StructureId, file: PathBuf },
    /// Check a structure file against the guard limits without storing it
    Validate { file: PathBuf },
    /// List stored structures of one kind
    List { kind: StructureKind },
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid structure in {path}: {message}")]
    InvalidStructure { path: PathBuf, message: String },

    #[error("Invalid limits in {path}: {message}")]
    InvalidLimits { path: PathBuf, message: String },

    #[error("Failed to encode output: {0}")]
    Output(String),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Edit(e) => e.code(),
            CliError::Read { .. } => "cli.read",
            CliError::InvalidNode(_) => "cli.invalid_node",
            CliError::InvalidStructure { .. } => "cli.invalid_structure",
            CliError::InvalidLimits { .. } => "cli.invalid_limits",
            CliError::Output(_) => "cli.output",
        }
    }
}

impl Cli {
    /// Guard limits from `--limits`, then `--max-nodes` / `--max-depth`.
    pub fn guard_limits(&self) -> Result<GuardLimits, CliError> {
        let mut limits = match &self.limits {
            Some(path) => {
                let invalid = |message: String| CliError::InvalidLimits {
                    path: path.clone(),
                    message,
                };
                let text = read_file(path)?;
                let value: serde_json::Value =
                    serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
                if !value.is_object() {
                    return Err(invalid("expected a JSON object of limits".to_string()));
                }
                serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?
            }
            None => GuardLimits::default(),
        };
        if let Some(max_nodes) = self.max_nodes {
            limits = limits.with_max_nodes(max_nodes);
        }
        if let Some(max_depth) = self.max_depth {
            limits = limits.with_max_depth(max_depth);
        }
        Ok(limits)
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String, CliError> {
    log::debug!("Reading {}...", path.display());
    std::fs::read_to_string(path).map_err(|e| CliError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
