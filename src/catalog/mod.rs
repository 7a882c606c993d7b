//! Tool catalog.
//!
//! Tools are leaves: each sits in exactly one folder and carries any number
//! of labels through the `tool_labels` join table.

mod filter;

use std::collections::HashMap;

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AdminError, Result};
use crate::hierarchy::Folders;
use crate::store::{LabelRef, NewTool, ToolRecord, ToolUpdate, copy_name, now_ms};

pub use filter::{FolderPathCache, ToolFilter, ToolView};

const SELECT_TOOL: &str = "SELECT id, name, description, enabled, folder_id, created_at FROM tools";

/// Stateless accessor over the tool tables.
#[derive(Debug)]
pub struct ToolCatalog<'a> {
    conn: &'a Connection,
}

impl<'a> ToolCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a tool and return its id.
    pub fn create(&self, tool: &NewTool) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        ensure_folder(&tx, tool.folder_id)?;
        let id = insert_tool(&tx, &tool.name, &tool.description, tool.enabled, tool.folder_id)?;
        tx.commit()?;

        info!("Created tool {} '{}' in folder {}", id, tool.name, tool.folder_id);
        Ok(id)
    }

    /// Get a tool by id.
    pub fn get(&self, id: i64) -> Result<Option<ToolRecord>> {
        fetch_tool(self.conn, id)
    }

    /// Tools placed directly in `folder_id`, ordered by name.
    pub fn list_in_folder(&self, folder_id: i64) -> Result<Vec<ToolRecord>> {
        self.query(
            &format!("{} WHERE folder_id = ?1 ORDER BY name, id", SELECT_TOOL),
            [folder_id],
        )
    }

    /// Every tool, ordered by name.
    pub fn list_all(&self) -> Result<Vec<ToolRecord>> {
        self.query(&format!("{} ORDER BY name, id", SELECT_TOOL), [])
    }

    /// Apply a partial update and return the stored result.
    pub fn update(&self, id: i64, update: &ToolUpdate) -> Result<ToolRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let current = fetch_tool(&tx, id)?.ok_or_else(|| AdminError::not_found("tool", id))?;
        if update.is_empty() {
            debug!("Empty update for tool {}", id);
            return Ok(current);
        }
        let next = update.apply_to(&current);
        if next.folder_id != current.folder_id {
            ensure_folder(&tx, next.folder_id)?;
        }

        tx.execute(
            "UPDATE tools SET name = ?2, description = ?3, enabled = ?4, folder_id = ?5 WHERE id = ?1",
            params![id, next.name, next.description, next.enabled, next.folder_id],
        )?;
        tx.commit()?;

        info!("Updated tool {}", id);
        Ok(next)
    }

    /// Delete a tool. Its label associations cascade.
    pub fn delete(&self, id: i64) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM tools WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(AdminError::not_found("tool", id));
        }

        info!("Deleted tool {}", id);
        Ok(())
    }

    /// Place a tool in another folder.
    pub fn move_to(&self, id: i64, new_folder_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if fetch_tool(&tx, id)?.is_none() {
            return Err(AdminError::not_found("tool", id));
        }
        ensure_folder(&tx, new_folder_id)?;
        tx.execute(
            "UPDATE tools SET folder_id = ?2 WHERE id = ?1",
            params![id, new_folder_id],
        )?;
        tx.commit()?;

        info!("Moved tool {} to folder {}", id, new_folder_id);
        Ok(())
    }

    /// Copy a tool into `target_folder_id`, labels included.
    pub fn copy(&self, id: i64, target_folder_id: i64) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let source = fetch_tool(&tx, id)?.ok_or_else(|| AdminError::not_found("tool", id))?;
        ensure_folder(&tx, target_folder_id)?;

        let new_id = insert_tool(
            &tx,
            &copy_name(&source.name),
            &source.description,
            source.enabled,
            target_folder_id,
        )?;
        let labels = tx.execute(
            "INSERT INTO tool_labels (tool_id, label_id) SELECT ?2, label_id FROM tool_labels WHERE tool_id = ?1",
            params![id, new_id],
        )?;
        tx.commit()?;

        info!("Copied tool {} to {} with {} labels", id, new_id, labels);
        Ok(new_id)
    }

    /// Tag a tool. Tagging twice is a no-op.
    pub fn add_label(&self, tool_id: i64, label_id: i64) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO tool_labels (tool_id, label_id) VALUES (?1, ?2)",
            params![tool_id, label_id],
        )?;
        debug!("add_label({}, {}) inserted {} rows", tool_id, label_id, inserted);
        Ok(())
    }

    /// Untag a tool. Removing an absent association is a no-op.
    pub fn remove_label(&self, tool_id: i64, label_id: i64) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM tool_labels WHERE tool_id = ?1 AND label_id = ?2",
            params![tool_id, label_id],
        )?;
        debug!("remove_label({}, {}) removed {} rows", tool_id, label_id, removed);
        Ok(())
    }

    /// Labels on a tool, ordered by name.
    pub fn list_labels(&self, tool_id: i64) -> Result<Vec<LabelRef>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT labels.id, labels.name
            FROM labels
            JOIN tool_labels ON tool_labels.label_id = labels.id
            WHERE tool_labels.tool_id = ?1
            ORDER BY labels.name, labels.id
            "#,
        )?;
        let labels = stmt
            .query_map([tool_id], |row| {
                Ok(LabelRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(labels)
    }

    /// Labels of every tagged tool, keyed by tool id, in one query.
    pub fn label_map(&self) -> Result<HashMap<i64, Vec<LabelRef>>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tool_labels.tool_id, labels.id, labels.name
            FROM tool_labels
            JOIN labels ON labels.id = tool_labels.label_id
            ORDER BY labels.name, labels.id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                LabelRef {
                    id: row.get(1)?,
                    name: row.get(2)?,
                },
            ))
        })?;

        let mut map: HashMap<i64, Vec<LabelRef>> = HashMap::new();
        for row in rows {
            let (tool_id, label) = row?;
            map.entry(tool_id).or_default().push(label);
        }
        Ok(map)
    }

    /// Full fetch resolved into views, then filtered in memory.
    pub fn search(&self, filter: &ToolFilter) -> Result<Vec<ToolView>> {
        let tools = self.list_all()?;
        let mut labels = self.label_map()?;
        let mut paths = FolderPathCache::load(&Folders::new(self.conn))?;

        let mut views = Vec::with_capacity(tools.len());
        for tool in tools {
            let folder_path = paths.path(tool.folder_id);
            let tool_labels = labels.remove(&tool.id).unwrap_or_default();
            let view = ToolView {
                tool,
                folder_path,
                labels: tool_labels,
            };
            if filter.matches(&view) {
                views.push(view);
            }
        }

        debug!("search matched {} tools", views.len());
        Ok(views)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ToolRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let tools = stmt
            .query_map(params, map_tool)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tools)
    }
}

fn insert_tool(conn: &Connection, name: &str, description: &str, enabled: bool, folder_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO tools (name, description, enabled, folder_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, description, enabled, folder_id, now_ms()],
    )?;
    let id = conn.last_insert_rowid();
    if fetch_tool(conn, id)?.is_none() {
        return Err(AdminError::CreationFailed(format!(
            "tool {} was not readable after insert",
            id
        )));
    }
    Ok(id)
}

fn ensure_folder(conn: &Connection, folder_id: i64) -> Result<()> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM folders WHERE id = ?1)",
        [folder_id],
        |row| row.get(0),
    )?;
    if !found {
        return Err(AdminError::ConstraintViolation(format!(
            "folder {} does not exist",
            folder_id
        )));
    }
    Ok(())
}

fn fetch_tool(conn: &Connection, id: i64) -> Result<Option<ToolRecord>> {
    let tool = conn
        .query_row(&format!("{} WHERE id = ?1", SELECT_TOOL), [id], map_tool)
        .optional()?;
    Ok(tool)
}

fn map_tool(row: &Row<'_>) -> rusqlite::Result<ToolRecord> {
    Ok(ToolRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        enabled: row.get(3)?,
        folder_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}
