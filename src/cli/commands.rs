//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - folder / label: manage the two hierarchies
//! - tool: manage the tool catalog
//! - registry: inspect and toggle the registry tree
//! - plugin: list and call runnable tools

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolshed - manage folders, labels and tools
#[derive(Parser, Debug)]
#[command(name = "toolshed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file, overrides config and environment
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Folder hierarchy
    Folder {
        #[command(subcommand)]
        command: HierarchyCommands,
    },

    /// Label hierarchy
    Label {
        #[command(subcommand)]
        command: HierarchyCommands,
    },

    /// Tool catalog
    Tool {
        #[command(subcommand)]
        command: ToolCommands,
    },

    /// In-memory registry tree
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },

    /// Runnable plugin tools
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },
}

/// Operations shared by the folder and label hierarchies
#[derive(Subcommand, Debug, Clone)]
pub enum HierarchyCommands {
    /// List direct children of a node
    List {
        /// Parent node ID (defaults to root)
        #[arg(short, long, default_value_t = 1)]
        parent: i64,
    },

    /// Show the whole hierarchy as a tree
    Tree,

    /// Show a single node
    Show { id: i64 },

    /// Create a node
    Create {
        name: String,

        /// Parent node ID (defaults to root)
        #[arg(short, long, default_value_t = 1)]
        parent: i64,
    },

    /// Rename a node
    Rename { id: i64, name: String },

    /// Delete a node, reparenting its children
    Delete { id: i64 },

    /// Move a node under a new parent
    Move { id: i64, parent: i64 },

    /// Copy a node (without its children) under a parent
    Copy { id: i64, parent: i64 },
}

/// Tool catalog subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ToolCommands {
    /// List tools, optionally filtered
    List {
        /// Only tools directly in this folder
        #[arg(short, long)]
        folder: Option<i64>,

        /// Substring of name or description
        #[arg(short, long)]
        search: Option<String>,

        /// Substring of the folder path
        #[arg(long)]
        folder_path: Option<String>,

        /// Comma-separated label IDs, e.g. "2,5"
        #[arg(short, long)]
        labels: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a single tool
    Show { id: i64 },

    /// Create a tool
    Create {
        name: String,

        #[arg(short, long, default_value_t = 1)]
        folder: i64,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Create the tool disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Update any subset of a tool's fields
    Update {
        id: i64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        enabled: Option<bool>,

        #[arg(short, long)]
        folder: Option<i64>,
    },

    /// Delete a tool
    Delete { id: i64 },

    /// Move a tool to another folder
    Move { id: i64, folder: i64 },

    /// Copy a tool, with its labels, into a folder
    Copy { id: i64, folder: i64 },

    /// Attach a label to a tool
    Tag { id: i64, label: i64 },

    /// Detach a label from a tool
    Untag { id: i64, label: i64 },

    /// List the labels of a tool
    Labels { id: i64 },
}

/// Registry tree subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RegistryCommands {
    /// Print the registry tree
    List {
        #[arg(long)]
        json: bool,
    },

    /// Enable a node by name
    Enable { name: String },

    /// Disable a node by name
    Disable { name: String },

    /// Print the label path from the root to a node
    Path { name: String },
}

/// Plugin subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PluginCommands {
    /// List registered plugin tools
    List,

    /// Call a plugin tool
    Call {
        name: String,

        /// JSON payload
        #[arg(short, long, default_value = "null")]
        payload: String,
    },
}
