use super::{decode, Cache, CacheError, CACHE_KEY};
use crate::models::TodoList;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_VERSION: i32 = 1;

const INIT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Cache kept as a key/value row in a SQLite database.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = PathBuf::from(shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)
            .map_err(|e| CacheError::Cache(format!("Failed to open database: {}", e)))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    fn in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(INIT_SCHEMA)
            .map_err(|e| CacheError::Cache(format!("Failed to create cache tables: {}", e)))?;

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()?;
        match version {
            None => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )?;
            }
            Some(v) if v > SCHEMA_VERSION => {
                return Err(CacheError::Cache(format!(
                    "Cache schema version {} is newer than supported version {}",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn get_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Cache(format!("Failed to lock connection: {}", e)))
    }

    /// When the snapshot was last written, if ever.
    #[cfg(test)]
    fn last_saved(&self) -> Result<Option<chrono::DateTime<Utc>>, CacheError> {
        let conn = self.get_connection()?;
        let stamp: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM cache WHERE key = ?1",
                [CACHE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        stamp
            .map(|s| {
                chrono::DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| CacheError::Cache(format!("Invalid updated_at value: {}", e)))
            })
            .transpose()
    }
}

impl Cache for SqliteCache {
    fn load(&self) -> Result<Option<Vec<TodoList>>, CacheError> {
        let conn = self.get_connection()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM cache WHERE key = ?1",
                [CACHE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            Some(json) => decode(&json),
            None => Ok(None),
        }
    }

    fn save(&self, lists: &[TodoList]) -> Result<(), CacheError> {
        let json = serde_json::to_string(lists)?;
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO cache (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![CACHE_KEY, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        let conn = self.get_connection()?;
        conn.execute("DELETE FROM cache WHERE key = ?1", [CACHE_KEY])?;
        Ok(())
    }
}
