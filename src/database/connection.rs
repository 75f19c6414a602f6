/*!
 * Database connection management.
 *
 * This module handles SQLite connection creation and initialization, for both
 * the ephemeral in-memory store and an optional on-disk file, and hands out
 * locked access to the underlying connection.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::schema;
use crate::app_config::DatabaseConfig;

/// Path marker used for the in-memory store
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Database connection wrapper with shared, locked access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file, or `:memory:`
    db_path: PathBuf,
    /// Connection shared behind a lock
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open the store described by the configuration
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if config.is_in_memory() {
            Self::new_in_memory()
        } else {
            Self::new(&config.path)
        }
    }

    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {:?}", parent)
                })?;
            }
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        Self::from_connection(conn, db_path)
    }

    /// Create an in-memory database; contents are discarded on drop
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        Self::from_connection(conn, PathBuf::from(IN_MEMORY_PATH))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Whether this is the ephemeral in-memory store
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Whether no transaction is currently open on the connection
    pub fn is_autocommit(&self) -> bool {
        self.connection.lock().is_autocommit()
    }

    /// Execute a database operation with the connection
    ///
    /// The lock is held for the duration of the closure.
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.execute(|conn| {
            let student_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;

            let indexes = schema::student_indexes(conn)?;

            let file_size = if self.is_in_memory() {
                0
            } else {
                std::fs::metadata(&self.db_path)
                    .map(|m| m.len())
                    .unwrap_or(0)
            };

            Ok(DatabaseStats {
                student_count,
                indexes,
                file_size_bytes: file_size,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Number of stored students
    pub student_count: i64,
    /// Secondary indexes declared on `students`
    pub indexes: Vec<String>,
    /// Database file size in bytes (0 for in-memory)
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Students: {}, Indexes: [{}], Size: {} KB",
            self.student_count,
            self.indexes.join(", "),
            self.file_size_bytes / 1024
        )
    }
}
