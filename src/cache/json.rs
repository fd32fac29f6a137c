use super::{decode, Cache, CacheError};
use crate::models::TodoList;
use std::path::{Path, PathBuf};

/// Cache kept as a single JSON file holding the list collection.
pub struct JsonCache {
    path: PathBuf,
}

impl JsonCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
        Self {
            path: PathBuf::from(path),
        }
    }
}

impl Cache for JsonCache {
    fn load(&self) -> Result<Option<Vec<TodoList>>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        decode(&contents)
    }

    fn save(&self, lists: &[TodoList]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(lists)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_utils::sample_lists;

    #[test]
    fn test_json_cache_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(temp_dir.path().join("nested").join("cache.json"));

        assert!(cache.load().unwrap().is_none());
        cache.save(&sample_lists()).unwrap();

        let loaded = cache.load().unwrap().unwrap();
        assert_eq!(loaded, sample_lists());
        assert_eq!(loaded[0].items[0].id, 101);
        assert_eq!(loaded[0].items[1].id, 102);
    }

    #[test]
    fn test_blank_file_is_a_miss() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "  \n").unwrap();
        let cache = JsonCache::new(temp_file.path());
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "{not json").unwrap();
        let cache = JsonCache::new(temp_file.path());
        assert!(matches!(cache.load(), Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_clear_missing_file_is_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(temp_dir.path().join("absent.json"));
        assert!(cache.clear().is_ok());
    }
}
