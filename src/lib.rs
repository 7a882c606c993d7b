//! Toolshed - folder and label hierarchies with a tool catalog
//!
//! Folders and labels are two independent rooted trees persisted in SQLite.
//! Tools live in exactly one folder and carry any number of labels. A separate
//! in-memory registry tree tracks per-tool enablement, and the plugin registry
//! dispatches runnable tools by name.

pub mod catalog;
pub mod error;
pub mod hierarchy;
pub mod registry;
pub mod store;
pub mod tools;

pub use error::{AdminError, Result};
