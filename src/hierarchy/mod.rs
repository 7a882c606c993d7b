//! Folder and label hierarchies.
//!
//! Both hierarchies are the same self-referencing tree: an entity table plus a
//! parent-link table keyed by child id. `Hierarchy<K>` implements the
//! operations once; `NodeKind` supplies the table names and the hook for
//! records that hang off a node (tools placed in a folder).
//!
//! Every mutation that touches more than one row runs in a transaction, so a
//! failure part-way leaves no partial state behind.

mod tree;

use std::collections::HashSet;
use std::marker::PhantomData;

use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{AdminError, Result};
use crate::store::{NodeRecord, ROOT_ID, copy_name, now_ms};

pub use tree::{HierarchyTree, TreeNode};

/// Table layout of one kind of hierarchy node.
pub trait NodeKind {
    /// Singular noun used in error messages and logs
    const NOUN: &'static str;
    /// Entity table
    const TABLE: &'static str;
    /// Parent-link table
    const LINK_TABLE: &'static str;
    /// Child id column of the parent-link table
    const LINK_COLUMN: &'static str;

    /// Re-home records that point at a node about to be deleted.
    ///
    /// Runs inside the delete transaction. Returns the number of rows moved.
    fn reparent_members(_conn: &Connection, _from: i64, _to: i64) -> Result<usize> {
        Ok(0)
    }
}

/// Folder nodes. Tools placed in a deleted folder move to its parent.
#[derive(Debug, Clone, Copy)]
pub struct FolderKind;

impl NodeKind for FolderKind {
    const NOUN: &'static str = "folder";
    const TABLE: &'static str = "folders";
    const LINK_TABLE: &'static str = "folder_tree";
    const LINK_COLUMN: &'static str = "folder_id";

    fn reparent_members(conn: &Connection, from: i64, to: i64) -> Result<usize> {
        let moved = conn.execute(
            "UPDATE tools SET folder_id = ?2 WHERE folder_id = ?1",
            params![from, to],
        )?;
        Ok(moved)
    }
}

/// Label nodes. Tool associations of a deleted label cascade away.
#[derive(Debug, Clone, Copy)]
pub struct LabelKind;

impl NodeKind for LabelKind {
    const NOUN: &'static str = "label";
    const TABLE: &'static str = "labels";
    const LINK_TABLE: &'static str = "label_tree";
    const LINK_COLUMN: &'static str = "label_id";
}

/// Stateless accessor over one hierarchy. Every read re-queries the store.
#[derive(Debug)]
pub struct Hierarchy<'a, K: NodeKind> {
    conn: &'a Connection,
    kind: PhantomData<K>,
}

/// Folder hierarchy accessor
pub type Folders<'a> = Hierarchy<'a, FolderKind>;

/// Label hierarchy accessor
pub type Labels<'a> = Hierarchy<'a, LabelKind>;

impl<'a, K: NodeKind> Hierarchy<'a, K> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            kind: PhantomData,
        }
    }

    /// Create a node under `parent_id` and return its id.
    ///
    /// The entity row and its parent link are written together; a missing
    /// parent rolls both back.
    pub fn create(&self, name: &str, parent_id: i64) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let id = Self::insert(&tx, name, parent_id)?;
        tx.commit()?;

        info!("Created {} {} '{}' under {}", K::NOUN, id, name, parent_id);
        Ok(id)
    }

    /// Get a node with its resolved parent.
    pub fn get(&self, id: i64) -> Result<Option<NodeRecord>> {
        Self::fetch(self.conn, id)
    }

    /// Direct children of `parent_id`, ordered by name.
    pub fn list_children(&self, parent_id: i64) -> Result<Vec<NodeRecord>> {
        self.query(
            &format!("{} WHERE t.parent_id = ?1 ORDER BY n.name, n.id", Self::select_sql()),
            [parent_id],
        )
    }

    /// Every node including the root, ordered by id.
    pub fn list_all(&self) -> Result<Vec<NodeRecord>> {
        self.query(&format!("{} ORDER BY n.id", Self::select_sql()), [])
    }

    /// Build the nested view of the whole hierarchy.
    pub fn tree(&self) -> Result<HierarchyTree> {
        Ok(HierarchyTree::build_from_records(self.list_all()?))
    }

    /// Rename a node. Sibling names need not be unique.
    pub fn update(&self, id: i64, name: &str) -> Result<()> {
        if id == ROOT_ID {
            warn!("Rejected rename of root {}", K::NOUN);
            return Err(AdminError::ConstraintViolation(format!(
                "root {} cannot be renamed",
                K::NOUN
            )));
        }

        let changed = self.conn.execute(
            &format!("UPDATE {} SET name = ?2 WHERE id = ?1", K::TABLE),
            params![id, name],
        )?;
        if changed == 0 {
            return Err(AdminError::not_found(K::NOUN, id));
        }

        info!("Renamed {} {} to '{}'", K::NOUN, id, name);
        Ok(())
    }

    /// Delete a node, splicing it out of the tree.
    ///
    /// Children and members are reparented to the node's former parent before
    /// the row goes. The root can never be deleted.
    pub fn delete(&self, id: i64) -> Result<()> {
        if id == ROOT_ID {
            warn!("Rejected delete of root {}", K::NOUN);
            return Err(AdminError::ConstraintViolation(format!(
                "root {} cannot be deleted",
                K::NOUN
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        let node = Self::fetch(&tx, id)?.ok_or_else(|| AdminError::not_found(K::NOUN, id))?;
        let Some(parent_id) = node.parent_id else {
            return Err(AdminError::ConstraintViolation(format!(
                "{} {} has no parent link",
                K::NOUN,
                id
            )));
        };

        let children = tx.execute(
            &format!("UPDATE {} SET parent_id = ?2 WHERE parent_id = ?1", K::LINK_TABLE),
            params![id, parent_id],
        )?;
        let members = K::reparent_members(&tx, id, parent_id)?;
        tx.execute(&format!("DELETE FROM {} WHERE id = ?1", K::TABLE), [id])?;
        tx.commit()?;

        info!(
            "Deleted {} {}; reparented {} children and {} members to {}",
            K::NOUN,
            id,
            children,
            members,
            parent_id
        );
        Ok(())
    }

    /// Move a node under a new parent.
    ///
    /// Moving a node under itself or any of its descendants is rejected.
    pub fn move_to(&self, id: i64, new_parent_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        if !Self::exists(&tx, id)? {
            return Err(AdminError::not_found(K::NOUN, id));
        }
        if id == new_parent_id {
            warn!("Rejected move of {} {} into itself", K::NOUN, id);
            return Err(AdminError::InvalidOperation(format!(
                "cannot move {} {} into itself",
                K::NOUN,
                id
            )));
        }
        if !Self::exists(&tx, new_parent_id)? {
            return Err(AdminError::ConstraintViolation(format!(
                "parent {} {} does not exist",
                K::NOUN,
                new_parent_id
            )));
        }
        if Self::closure(&tx, id)?.contains(&new_parent_id) {
            warn!(
                "Rejected move of {} {} under its descendant {}",
                K::NOUN,
                id,
                new_parent_id
            );
            return Err(AdminError::InvalidOperation(format!(
                "cannot move {} {} under its descendant {}",
                K::NOUN,
                id,
                new_parent_id
            )));
        }

        tx.execute(
            &format!(
                "UPDATE {} SET parent_id = ?2 WHERE {} = ?1",
                K::LINK_TABLE,
                K::LINK_COLUMN
            ),
            params![id, new_parent_id],
        )?;
        tx.commit()?;

        info!("Moved {} {} under {}", K::NOUN, id, new_parent_id);
        Ok(())
    }

    /// Copy a single node (not its descendants) under `new_parent_id`.
    pub fn copy(&self, id: i64, new_parent_id: i64) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let source = Self::fetch(&tx, id)?.ok_or_else(|| AdminError::not_found(K::NOUN, id))?;
        let new_id = Self::insert(&tx, &copy_name(&source.name), new_parent_id)?;
        tx.commit()?;

        info!("Copied {} {} to {} under {}", K::NOUN, id, new_id, new_parent_id);
        Ok(new_id)
    }

    /// Transitive descendants of `id`, the node itself included, ordered by id.
    pub fn descendants(&self, id: i64) -> Result<Vec<i64>> {
        self.require(id)?;
        let mut ids: Vec<i64> = Self::closure(self.conn, id)?.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Check if `candidate` lies in the subtree rooted at `id`.
    pub fn is_descendant(&self, candidate: i64, id: i64) -> Result<bool> {
        self.require(id)?;
        Ok(Self::closure(self.conn, id)?.contains(&candidate))
    }

    fn require(&self, id: i64) -> Result<()> {
        if Self::exists(self.conn, id)? {
            Ok(())
        } else {
            Err(AdminError::not_found(K::NOUN, id))
        }
    }

    fn insert(conn: &Connection, name: &str, parent_id: i64) -> Result<i64> {
        if !Self::exists(conn, parent_id)? {
            return Err(AdminError::ConstraintViolation(format!(
                "parent {} {} does not exist",
                K::NOUN,
                parent_id
            )));
        }

        conn.execute(
            &format!("INSERT INTO {} (name, created_at) VALUES (?1, ?2)", K::TABLE),
            params![name, now_ms()],
        )?;
        let id = conn.last_insert_rowid();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, parent_id) VALUES (?1, ?2)",
                K::LINK_TABLE,
                K::LINK_COLUMN
            ),
            params![id, parent_id],
        )?;

        match Self::fetch(conn, id)? {
            Some(record) if record.parent_id == Some(parent_id) => Ok(id),
            _ => Err(AdminError::CreationFailed(format!(
                "{} {} was not readable after insert",
                K::NOUN,
                id
            ))),
        }
    }

    fn fetch(conn: &Connection, id: i64) -> Result<Option<NodeRecord>> {
        let record = conn
            .query_row(
                &format!("{} WHERE n.id = ?1", Self::select_sql()),
                [id],
                Self::map_row,
            )
            .optional()?;
        Ok(record)
    }

    fn exists(conn: &Connection, id: i64) -> Result<bool> {
        let found: bool = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", K::TABLE),
            [id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn closure(conn: &Connection, id: i64) -> Result<HashSet<i64>> {
        let sql = format!(
            r#"
            WITH RECURSIVE descendants(id) AS (
                SELECT ?1
                UNION
                SELECT t.{col}
                FROM {link} t
                JOIN descendants d ON t.parent_id = d.id
            )
            SELECT id FROM descendants
            "#,
            col = K::LINK_COLUMN,
            link = K::LINK_TABLE,
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<i64>>>()?;

        debug!("Closure of {} {} has {} nodes", K::NOUN, id, ids.len());
        Ok(ids)
    }

    fn select_sql() -> String {
        format!(
            "SELECT n.id, n.name, t.parent_id, n.created_at FROM {} n LEFT JOIN {} t ON t.{} = n.id",
            K::TABLE,
            K::LINK_TABLE,
            K::LINK_COLUMN
        )
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<NodeRecord> {
        Ok(NodeRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            parent_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<NodeRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
