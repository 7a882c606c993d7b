//! Relational store for toolshed.
//!
//! A single SQLite database holds both hierarchies, their parent-link tables,
//! the tools and the tool-label join table. Foreign keys are enforced so
//! orphaned links are structurally impossible.
//!
//! # Example
//!
//! ```ignore
//! use toolshed::store::{Database, NewTool, ROOT_ID};
//!
//! let db = Database::open_in_memory()?;
//! let inbox = db.folders().create("Inbox", ROOT_ID)?;
//! let tool = db.tools().create(&NewTool::new("archive").in_folder(inbox))?;
//! ```

mod db;
mod records;

pub use db::Database;
pub use records::{LabelRef, NewTool, NodeRecord, ROOT_ID, ToolRecord, ToolUpdate, copy_name, now_ms};
