//! SQLite-backed relational store.
//!
//! `Database` owns the connection. Foreign keys are switched on for every
//! connection and the embedded migrations are applied on open, so a fresh
//! database always has both root nodes in place.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

use crate::catalog::ToolCatalog;
use crate::error::Result;
use crate::hierarchy::{Folders, Labels};

/// Versioned schema migrations, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_hierarchy.sql",
        r#"
        CREATE TABLE folders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (name <> ''),
            created_at INTEGER NOT NULL
        );

        CREATE TABLE folder_tree (
            folder_id INTEGER PRIMARY KEY REFERENCES folders(id) ON DELETE CASCADE,
            parent_id INTEGER NOT NULL REFERENCES folders(id)
        );

        CREATE INDEX idx_folder_tree_parent ON folder_tree(parent_id);

        CREATE TABLE labels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (name <> ''),
            created_at INTEGER NOT NULL
        );

        CREATE TABLE label_tree (
            label_id INTEGER PRIMARY KEY REFERENCES labels(id) ON DELETE CASCADE,
            parent_id INTEGER NOT NULL REFERENCES labels(id)
        );

        CREATE INDEX idx_label_tree_parent ON label_tree(parent_id);

        INSERT INTO folders (id, name, created_at)
        VALUES (1, 'root', CAST(strftime('%s', 'now') AS INTEGER) * 1000);
        INSERT INTO labels (id, name, created_at)
        VALUES (1, 'root', CAST(strftime('%s', 'now') AS INTEGER) * 1000);

        CREATE TRIGGER folders_protect_root
        BEFORE DELETE ON folders
        WHEN OLD.id = 1
        BEGIN
            SELECT RAISE(ABORT, 'root folder cannot be deleted');
        END;

        CREATE TRIGGER labels_protect_root
        BEFORE DELETE ON labels
        WHEN OLD.id = 1
        BEGIN
            SELECT RAISE(ABORT, 'root label cannot be deleted');
        END;
        "#,
    ),
    (
        "0002_tools.sql",
        r#"
        CREATE TABLE tools (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            enabled INTEGER NOT NULL DEFAULT 1,
            folder_id INTEGER NOT NULL DEFAULT 1 REFERENCES folders(id),
            created_at INTEGER NOT NULL
        );

        CREATE INDEX idx_tools_folder ON tools(folder_id);

        CREATE TABLE tool_labels (
            tool_id INTEGER NOT NULL REFERENCES tools(id) ON DELETE CASCADE,
            label_id INTEGER NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
            UNIQUE (tool_id, label_id)
        );

        CREATE INDEX idx_tool_labels_label ON tool_labels(label_id);
        "#,
    ),
];

/// Owner of the SQLite connection. Repositories borrow it.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create a database file, applying pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let db = Self::init(conn, Some(path.to_path_buf()))?;
        info!("Opened database at {}", path.display());
        Ok(db)
    }

    /// Open a private in-memory database. Useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self { conn, path };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Apply every migration not yet recorded in `schema_migrations`.
    ///
    /// Each migration runs in its own transaction together with its
    /// bookkeeping row.
    pub fn apply_migrations(&self) -> Result<usize> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (version TEXT PRIMARY KEY);",
        )?;

        let mut applied = 0;
        for (version, sql) in MIGRATIONS {
            let done: Option<String> = self
                .conn
                .query_row(
                    "SELECT version FROM schema_migrations WHERE version = ?1",
                    [version],
                    |row| row.get(0),
                )
                .optional()?;
            if done.is_some() {
                continue;
            }

            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(sql)?;
            tx.execute("INSERT INTO schema_migrations (version) VALUES (?1)", [version])?;
            tx.commit()?;

            debug!("Applied migration {}", version);
            applied += 1;
        }

        Ok(applied)
    }

    /// Versions recorded as applied, in order.
    pub fn applied_migrations(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    /// Borrow the raw connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// File path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Folder hierarchy accessor.
    pub fn folders(&self) -> Folders<'_> {
        Folders::new(&self.conn)
    }

    /// Label hierarchy accessor.
    pub fn labels(&self) -> Labels<'_> {
        Labels::new(&self.conn)
    }

    /// Tool catalog accessor.
    pub fn tools(&self) -> ToolCatalog<'_> {
        ToolCatalog::new(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdminError;
    use tempfile::TempDir;

    #[test]
    fn test_root_folder_and_label_exist() {
        let db = Database::open_in_memory().unwrap();
        let folder: String = db
            .connection()
            .query_row("SELECT name FROM folders WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        let label: String = db
            .connection()
            .query_row("SELECT name FROM labels WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folder, "root");
        assert_eq!(label, "root");
    }

    #[test]
    fn test_delete_root_rows_is_blocked_by_store() {
        let db = Database::open_in_memory().unwrap();
        let err: AdminError = db
            .connection()
            .execute("DELETE FROM folders WHERE id = 1", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, AdminError::ConstraintViolation(_)));

        let err: AdminError = db
            .connection()
            .execute("DELETE FROM labels WHERE id = 1", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, AdminError::ConstraintViolation(_)));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        let err: AdminError = db
            .connection()
            .execute(
                "INSERT INTO tools (name, folder_id, created_at) VALUES ('t', 999, 0)",
                [],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, AdminError::ConstraintViolation(_)));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.apply_migrations().unwrap(), 0);
        assert_eq!(
            db.applied_migrations().unwrap(),
            vec!["0001_hierarchy.sql".to_string(), "0002_tools.sql".to_string()]
        );
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("toolshed.sqlite");

        let db = Database::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("toolshed.sqlite");

        let id = {
            let db = Database::open(&path).unwrap();
            db.folders().create("persistent", 1).unwrap()
        };

        let db = Database::open(&path).unwrap();
        let folder = db.folders().get(id).unwrap().unwrap();
        assert_eq!(folder.name, "persistent");
    }
}
