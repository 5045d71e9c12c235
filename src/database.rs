use std::io;
use std::path::Path;
use std::time::Duration;

use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};

use crate::error::AlertDeskError;
use crate::schema::{CREATE_SCHEMA_SQL, SCHEMA_VERSION};

const POOL_SIZE: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Shared handle to the SQLite store. Cloning is cheap; all clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens (creating if needed) the database file at `db_path` and makes
    /// sure the schema is current.
    pub fn open(db_path: &Path) -> Result<Self, AlertDeskError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(AlertDeskError::IoError(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "Database folder '{}' does not exist or is not a directory",
                        parent.display()
                    ),
                )));
            }
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder().max_size(POOL_SIZE).build(manager)?;
        let db = Database { pool };

        db.ensure_schema()?;
        info!("Database opened at: {}", db_path.display());

        Ok(db)
    }

    pub fn conn(&self) -> Result<DbConnection, AlertDeskError> {
        Ok(self.pool.get()?)
    }

    fn ensure_schema(&self) -> Result<(), AlertDeskError> {
        let conn = self.conn()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)?;

        if !table_exists {
            return Self::create_schema(&conn);
        }

        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(AlertDeskError::Error(format!(
                "Schema version mismatch: found {}, expected {}",
                other, SCHEMA_VERSION
            ))),
            None => Err(AlertDeskError::Error("Schema version missing".to_string())),
        }
    }

    fn create_schema(conn: &Connection) -> Result<(), AlertDeskError> {
        info!("Creating database schema version {}", SCHEMA_VERSION);
        conn.execute_batch(CREATE_SCHEMA_SQL)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A database in a fresh temp directory. Keep the `TempDir` alive for as
    /// long as the database is used.
    pub(crate) fn temp_database() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("alerts.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_open_creates_schema() {
        let (_dir, db) = temp_database();
        let conn = db.conn().unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name IN ('user', 'alert') ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, vec!["alert".to_string(), "user".to_string()]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .unwrap()
                .execute(
                    "INSERT INTO user (email, password, name, role) VALUES ('a@b.c', 'x', 'A', 'faculty')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT count(*) FROM user", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_schema_version_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alerts.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .unwrap()
                .execute("UPDATE meta SET value = '99' WHERE key = 'schema_version'", [])
                .unwrap();
        }

        assert!(matches!(Database::open(&path), Err(AlertDeskError::Error(_))));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let (_dir, db) = temp_database();
        let result = db.conn().unwrap().execute(
            "INSERT INTO alert (user_id, latitude, longitude, timestamp) VALUES (999, 0.0, 0.0, '2024-01-01 00:00:00+00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_folder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-such-dir").join("alerts.db");
        match Database::open(&path) {
            Err(AlertDeskError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("open should fail without the folder"),
        }
    }
}
