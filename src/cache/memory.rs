use super::{decode, Cache, CacheError};
use crate::models::TodoList;
use std::sync::Mutex;

/// In-process cache. Snapshots are still stored as JSON so that loading goes
/// through the same decoding as the persistent backends.
#[derive(Default)]
pub struct MemoryCache {
    value: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lists(lists: &[TodoList]) -> Result<Self, CacheError> {
        let cache = Self::new();
        cache.save(lists)?;
        Ok(cache)
    }

    /// Stores a raw value, bypassing serialization.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(raw.into())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, CacheError> {
        self.value
            .lock()
            .map_err(|e| CacheError::Cache(format!("Failed to lock cache: {}", e)))
    }
}

impl Cache for MemoryCache {
    fn load(&self) -> Result<Option<Vec<TodoList>>, CacheError> {
        match self.lock()?.as_deref() {
            Some(raw) => decode(raw),
            None => Ok(None),
        }
    }

    fn save(&self, lists: &[TodoList]) -> Result<(), CacheError> {
        let json = serde_json::to_string(lists)?;
        *self.lock()? = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_utils::sample_lists;

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::with_lists(&sample_lists()).unwrap();
        assert_eq!(cache.load().unwrap(), Some(sample_lists()));
        cache.clear().unwrap();
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_raw_garbage_fails_to_decode() {
        let cache = MemoryCache::with_raw("[{\"id\":");
        assert!(matches!(cache.load(), Err(CacheError::Serialization(_))));
    }
}
