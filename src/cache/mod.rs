use crate::models::TodoList;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub mod json;
pub mod memory;
pub mod sqlite;

pub use json::JsonCache;
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

/// Key under which the full list collection is stored.
pub const CACHE_KEY: &str = "todo-lists";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Json,
    Sqlite,
}

impl CacheType {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheType::Json => "json",
            CacheType::Sqlite => "sqlite",
        }
    }
}

impl FromStr for CacheType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(CacheType::Json),
            "sqlite" => Ok(CacheType::Sqlite),
            other => Err(CacheError::Cache(format!("Unknown cache type: {other}"))),
        }
    }
}

/// Persistent snapshot of the whole list collection.
///
/// `load` returns `Ok(None)` when nothing has been cached yet.
pub trait Cache: Send + Sync {
    fn load(&self) -> Result<Option<Vec<TodoList>>, CacheError>;
    fn save(&self, lists: &[TodoList]) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
}

impl<T: Cache + ?Sized> Cache for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<Vec<TodoList>>, CacheError> {
        (**self).load()
    }

    fn save(&self, lists: &[TodoList]) -> Result<(), CacheError> {
        (**self).save(lists)
    }

    fn clear(&self) -> Result<(), CacheError> {
        (**self).clear()
    }
}

pub fn create_cache(cache_type: CacheType, path: &Path) -> Result<Box<dyn Cache>, CacheError> {
    match cache_type {
        CacheType::Json => Ok(Box::new(JsonCache::new(path))),
        CacheType::Sqlite => Ok(Box::new(SqliteCache::new(path)?)),
    }
}

pub(crate) fn decode(contents: &str) -> Result<Option<Vec<TodoList>>, CacheError> {
    if contents.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(contents)?))
}
