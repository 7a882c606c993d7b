//! CLI module for toolshed - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for the folder and label
//! hierarchies, the tool catalog, the registry tree and plugins.

pub mod commands;

pub use commands::Cli;
